use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use futures_util::stream;
use http_body_util::BodyExt as _;
use mindspeak::{
    api::{
        ApiError, ApiResponse, ApiResult, Backend, Message, SendMessage, SignIn, SignUp, SignedIn,
        SuggestionStream,
    },
    session::Viewer,
    AppState, Site,
};
use tower::ServiceExt; // for Router::oneshot

/// Collaborator that accepts every sign-up and only knows alice's password.
#[derive(Default)]
struct StubBackend {
    calls: Mutex<Vec<String>>,
}

impl StubBackend {
    fn log(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_owned());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for StubBackend {
    async fn check_username(&self, user_name: &str) -> ApiResult<ApiResponse> {
        self.log(&format!("check_username {user_name}"));
        Ok(ApiResponse::with_message("Username is unique"))
    }

    async fn sign_up(&self, form: &SignUp) -> ApiResult<ApiResponse> {
        self.log(&format!("sign_up {}", form.user_name));
        Ok(ApiResponse::with_message("Account created for you"))
    }

    async fn sign_in(&self, form: &SignIn) -> ApiResult<SignedIn> {
        self.log(&format!("sign_in {}", form.identifier));
        if form.identifier == "alice" && form.password == "hunter22" {
            Ok(SignedIn {
                message: Some("Signed in".into()),
                token: "tok".into(),
                user_name: "alice".into(),
            })
        } else {
            Err(ApiError::service(StatusCode::UNAUTHORIZED, "Incorrect password"))
        }
    }

    async fn accepting_messages(&self, _viewer: &Viewer) -> ApiResult<bool> {
        Ok(true)
    }

    async fn set_accepting_messages(&self, _viewer: &Viewer, accept: bool) -> ApiResult<ApiResponse> {
        Ok(ApiResponse {
            is_accepting_messages: Some(accept),
            ..ApiResponse::with_message("Message acceptance status updated successfully")
        })
    }

    async fn messages(&self, _viewer: &Viewer) -> ApiResult<Vec<Message>> {
        Ok(Vec::new())
    }

    async fn delete_message(&self, _viewer: &Viewer, _message_id: &str) -> ApiResult<ApiResponse> {
        Ok(ApiResponse::with_message("Message deleted"))
    }

    async fn send_message(&self, message: &SendMessage) -> ApiResult<ApiResponse> {
        self.log(&format!("send_message {}", message.user_name));
        Ok(ApiResponse::with_message("Message sent"))
    }

    async fn suggest_messages(&self) -> ApiResult<SuggestionStream> {
        Ok(Box::pin(stream::iter(vec![Ok("a||b||c".to_owned())])))
    }
}

fn app() -> (Router, Arc<StubBackend>) {
    let backend = Arc::new(StubBackend::default());
    let state = AppState {
        backend: backend.clone(),
        site: Site {
            public_url: "https://mindspeak.test".into(),
        },
    };
    (mindspeak::app(state, 60), backend)
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut req = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    req.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, form: &str, cookie: Option<&str>) -> Request<Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    req.body(Body::from(form.to_owned())).unwrap()
}

fn location(resp: &Response<Body>) -> &str {
    resp.headers()[header::LOCATION].to_str().unwrap()
}

/// `id=...` pair from the session cookie, if the response set one.
fn session_cookie(resp: &Response<Body>) -> Option<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("id="))
        .and_then(|v| v.split(';').next())
        .map(str::to_owned)
}

async fn text(resp: Response<Body>) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn landing_page_invites_guests_to_sign_up() {
    let (app, _) = app();

    let resp = app.oneshot(get("/", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = text(resp).await;
    assert!(html.contains(r#"href="/sign-up""#));
    assert!(html.contains("Login"));
}

#[tokio::test]
async fn stylesheet_and_script_are_served() {
    let (app, _) = app();

    let css = app.clone().oneshot(get("/style.css", None)).await.unwrap();
    assert_eq!(css.status(), StatusCode::OK);
    assert!(css.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/css"));

    let js = app.oneshot(get("/app.js", None)).await.unwrap();
    assert!(text(js).await.contains("function connect"));
}

#[tokio::test]
async fn dashboard_requires_sign_in() {
    let (app, _) = app();

    let resp = app.oneshot(get("/dashboard", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/sign-in?return_url=/dashboard");
}

#[tokio::test]
async fn invalid_sign_up_never_reaches_the_backend() {
    let (app, backend) = app();

    let resp = app
        .oneshot(post_form("/sign-up", "userName=a%21&email=nope&password=123", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = text(resp).await;
    assert_eq!(html.matches(r#"class="field-error""#).count(), 3);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn sign_up_redirects_to_sign_in_with_notice() {
    let (app, backend) = app();

    let resp = app
        .clone()
        .oneshot(post_form("/sign-up", "userName=bob_99&email=bob%40example.com&password=secret1", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/sign-in");
    assert_eq!(backend.calls(), ["sign_up bob_99"]);

    let cookie = session_cookie(&resp).expect("flash needs a session");
    let page = app.oneshot(get("/sign-in", Some(&cookie))).await.unwrap();
    let html = text(page).await;
    assert!(html.contains("Account created for you"));
}

#[tokio::test]
async fn wrong_password_is_reported() {
    let (app, _) = app();

    let resp = app
        .oneshot(post_form("/sign-in", "identifier=alice&password=nope", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let html = text(resp).await;
    assert!(html.contains("Sign In Failed"));
    assert!(html.contains("Incorrect password"));
    assert!(html.contains(r#"value="alice""#));
}

#[tokio::test]
async fn signed_in_viewer_sees_their_link() {
    let (app, _) = app();

    let resp = app
        .clone()
        .oneshot(post_form("/sign-in", "identifier=alice&password=hunter22", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");
    let cookie = session_cookie(&resp).expect("sign-in starts a session");

    let page = app.clone().oneshot(get("/dashboard", Some(&cookie))).await.unwrap();
    assert_eq!(page.status(), StatusCode::OK);
    let html = text(page).await;
    assert!(html.contains("https://mindspeak.test/u/alice"));
    assert!(html.contains("Welcome, alice"));

    let out = app.clone().oneshot(get("/sign-out", Some(&cookie))).await.unwrap();
    assert_eq!(location(&out), "/");
    let again = app.oneshot(get("/dashboard", Some(&cookie))).await.unwrap();
    assert_eq!(again.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn profile_renders_initial_suggestions() {
    let (app, _) = app();

    let resp = app.oneshot(get("/u/alice", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = text(resp).await;
    assert!(html.contains("Send Anonymous Message to @alice"));
    assert!(html.contains("Do you have any pets?"));
    assert_eq!(html.matches(r#"class="suggestion" data-generation="0""#).count(), 3);
}

#[tokio::test]
async fn profile_of_impossible_user_name_is_not_found() {
    let (app, _) = app();

    let resp = app.oneshot(get("/u/bad!name", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
