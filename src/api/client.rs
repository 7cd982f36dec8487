use std::time::Duration;

use async_trait::async_trait;
use futures_util::{future, stream, StreamExt};
use reqwest::{RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::session::Viewer;

use super::{
    ApiError, ApiResponse, ApiResult, Backend, Message, SendMessage, SignIn, SignUp, SignedIn,
    SuggestionStream,
};

#[derive(Serialize)]
struct AcceptMessages {
    #[serde(rename = "acceptMessages")]
    accept_messages: bool,
}

#[derive(Serialize)]
struct Completion<'a> {
    prompt: &'a str,
}

/// reqwest-backed [`Backend`] talking to the collaborator's `/api` routes.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let http = reqwest::ClientBuilder::new()
            .connect_timeout(timeout)
            .build()?;

        Ok(ApiClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request.timeout(self.timeout).send().await?;
        read(response).await
    }
}

fn authed(request: RequestBuilder, viewer: &Viewer) -> RequestBuilder {
    request.bearer_auth(&viewer.token)
}

async fn read<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();
    if status.is_success() {
        return response.json::<T>().await.map_err(ApiError::from_body);
    }

    let message = response
        .json::<ApiResponse>()
        .await
        .ok()
        .and_then(|body| body.message);
    debug!(%status, ?message, "collaborator refused request");
    Err(ApiError::Service { status, message })
}

/// Decode as much of `buf` as possible. Invalid bytes become U+FFFD; a
/// trailing incomplete code point stays in `buf` for the next chunk.
fn take_utf8(buf: &mut Vec<u8>) -> String {
    let mut text = String::new();
    let mut rest: &[u8] = buf;

    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                text.push_str(valid);
                rest = &[];
                break;
            }
            Err(e) => {
                let (valid, after) = rest.split_at(e.valid_up_to());
                text.push_str(&String::from_utf8_lossy(valid));
                match e.error_len() {
                    Some(bad) => {
                        text.push(char::REPLACEMENT_CHARACTER);
                        rest = &after[bad..];
                    }
                    None => {
                        rest = after;
                        break;
                    }
                }
            }
        }
    }

    *buf = rest.to_vec();
    text
}

#[async_trait]
impl Backend for ApiClient {
    async fn check_username(&self, user_name: &str) -> ApiResult<ApiResponse> {
        self.call(
            self.http
                .get(self.url("check-unique-username"))
                .query(&[("userName", user_name)]),
        )
        .await
    }

    async fn sign_up(&self, form: &SignUp) -> ApiResult<ApiResponse> {
        self.call(self.http.post(self.url("sign-up")).json(form)).await
    }

    async fn sign_in(&self, form: &SignIn) -> ApiResult<SignedIn> {
        self.call(self.http.post(self.url("sign-in")).json(form)).await
    }

    async fn accepting_messages(&self, viewer: &Viewer) -> ApiResult<bool> {
        let response: ApiResponse = self
            .call(authed(self.http.get(self.url("accept-message")), viewer))
            .await?;
        response
            .is_accepting_messages
            .ok_or_else(|| ApiError::Decode("expected isAcceptingMessages in response".into()))
    }

    async fn set_accepting_messages(&self, viewer: &Viewer, accept: bool) -> ApiResult<ApiResponse> {
        self.call(
            authed(self.http.post(self.url("accept-message")), viewer)
                .json(&AcceptMessages { accept_messages: accept }),
        )
        .await
    }

    async fn messages(&self, viewer: &Viewer) -> ApiResult<Vec<Message>> {
        let response: ApiResponse = self
            .call(authed(self.http.get(self.url("get-message")), viewer))
            .await?;
        Ok(response.messages.unwrap_or_default())
    }

    async fn delete_message(&self, viewer: &Viewer, message_id: &str) -> ApiResult<ApiResponse> {
        self.call(authed(
            self.http.delete(self.url(&format!("delete-message/{message_id}"))),
            viewer,
        ))
        .await
    }

    async fn send_message(&self, message: &SendMessage) -> ApiResult<ApiResponse> {
        self.call(self.http.post(self.url("send-message")).json(message))
            .await
    }

    async fn suggest_messages(&self) -> ApiResult<SuggestionStream> {
        // no overall timeout: generation streams for as long as the model talks
        let response = self
            .http
            .post(self.url("suggest-messages"))
            .json(&Completion { prompt: "" })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let refused = read::<ApiResponse>(response).await.err();
            return Err(refused.unwrap_or(ApiError::Service { status, message: None }));
        }

        // `None` marks the end of the body, where a dangling partial code
        // point is flushed as U+FFFD
        let mut carry = Vec::new();
        let pieces = response
            .bytes_stream()
            .map(Some)
            .chain(stream::once(async { None }))
            .map(move |chunk| -> ApiResult<String> {
                match chunk {
                    Some(chunk) => {
                        carry.extend_from_slice(&chunk?);
                        Ok(take_utf8(&mut carry))
                    }
                    None => Ok(String::from_utf8_lossy(&std::mem::take(&mut carry)).into_owned()),
                }
            })
            .filter(|piece| future::ready(!matches!(piece, Ok(text) if text.is_empty())));
        Ok(pieces.boxed())
    }
}
