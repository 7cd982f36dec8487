mod dashboard;
mod events;
mod home;
mod profile;
mod sign_in;
mod sign_up;
mod socket;

use axum::{http::StatusCode, response::{Html, IntoResponse, Response}, routing::get, Router};

use crate::{controller::{Notice, Variant}, include_res, res, session::Viewer, AppState};

pub use events::{ClientEvent, MessageView, ServerEvent};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/style.css", get(res::stylesheet))
        .route("/app.js", get(res::script))
        .route("/sign-up", get(sign_up::sign_up_page).post(sign_up::sign_up))
        .route("/sign-up/ws", get(sign_up::username_ws))
        .route("/sign-in", get(sign_in::sign_in_page).post(sign_in::sign_in))
        .route("/sign-out", get(sign_in::sign_out))
        .route("/dashboard", get(dashboard::dashboard))
        .route("/dashboard/ws", get(dashboard::dashboard_ws))
        .nest("/u", profile::router())
}

pub(crate) fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render a message body. Raw HTML written by a sender is shown as text.
pub(crate) fn markdown(content: &str) -> String {
    use pulldown_cmark::{Event, Parser};

    let parser = Parser::new(content).map(|event| match event {
        Event::Html(html) | Event::InlineHtml(html) => Event::Text(html),
        _ => event,
    });

    let mut html_output = String::new();
    pulldown_cmark::html::push_html(&mut html_output, parser);
    html_output
}

pub(crate) fn notice_html(notice: &Notice) -> String {
    let variant = match notice.variant {
        Variant::Default => "default",
        Variant::Destructive => "destructive",
    };
    let description = notice
        .description
        .as_deref()
        .map(|d| format!("<p>{}</p>", escape(d)))
        .unwrap_or_default();

    format!(
        r#"<div class="notice {variant}" role="status"><strong>{}</strong>{description}</div>"#,
        escape(&notice.title)
    )
}

pub(crate) fn layout(title: &str, viewer: Option<&Viewer>, notice: Option<&Notice>, body: &str) -> Html<String> {
    let nav = match viewer {
        Some(viewer) => include_res!(str, "/pages/nav_member.html")
            .replace("{user_name}", &escape(&viewer.user_name)),
        None => include_res!(str, "/pages/nav_guest.html").to_owned(),
    };

    Html(
        include_res!(str, "/pages/layout.html")
            .replace("{title}", &escape(title))
            .replace("{nav}", &nav)
            .replace("{notice}", &notice.map(notice_html).unwrap_or_default())
            .replace("{body}", body),
    )
}

pub(crate) fn sorry(what: &str) -> Response {
    let body = include_res!(str, "/pages/sorry.html").replace("{what}", &escape(what));
    (StatusCode::NOT_FOUND, layout("Not found", None, None, &body)).into_response()
}
