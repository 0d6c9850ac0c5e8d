use gloo_net::http::{Request, RequestBuilder, Response};
use market_core::forms::{LoginForm, RegisterForm};
use market_core::models::{AuthResponse, ChatMessage, Dialogue, OutgoingMessage, Post, User};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::view_model::error_message;

const API_BASE_URL: &str = match option_env!("MARKET_API_BASE_URL") {
    Some(value) => value,
    None => "http://127.0.0.1:8080/api",
};

#[derive(Debug, Clone, Error)]
pub(crate) enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("decode error: {0}")]
    Decode(String),
}

impl ApiError {
    /// 404 в поиске означает пустую выдачу, а не ошибку.
    pub(crate) fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }
}

fn endpoint(path: &str) -> String {
    format!(
        "{}/{}",
        API_BASE_URL.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn authorized(builder: RequestBuilder, token: &str) -> RequestBuilder {
    builder.header("Authorization", &format!("Bearer {token}"))
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response
        .json::<T>()
        .await
        .map_err(|err| ApiError::Decode(err.to_string()))
}

async fn parse_error_body(response: Response) -> ApiError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    ApiError::Http {
        status,
        message: error_message(status, &text),
    }
}

async fn send(request: Result<Request, gloo_net::Error>) -> Result<Response, ApiError> {
    let response = request
        .map_err(|err| ApiError::Network(err.to_string()))?
        .send()
        .await
        .map_err(|err| ApiError::Network(err.to_string()))?;

    if !response.ok() {
        return Err(parse_error_body(response).await);
    }
    Ok(response)
}

async fn get_json<T: DeserializeOwned>(path: &str, token: Option<&str>) -> Result<T, ApiError> {
    let mut builder = Request::get(&endpoint(path));
    if let Some(token) = token {
        builder = authorized(builder, token);
    }
    let response = send(builder.build()).await?;
    parse_json(response).await
}

pub(crate) async fn login(form: &LoginForm) -> Result<AuthResponse, ApiError> {
    let response = send(Request::post(&endpoint("/auth/login")).json(form)).await?;
    parse_json(response).await
}

pub(crate) async fn register(form: &RegisterForm) -> Result<AuthResponse, ApiError> {
    let response = send(Request::post(&endpoint("/auth/register")).json(form)).await?;
    parse_json(response).await
}

pub(crate) async fn current_user(token: &str) -> Result<User, ApiError> {
    get_json("/users/me", Some(token)).await
}

pub(crate) async fn list_posts() -> Result<Vec<Post>, ApiError> {
    get_json("/posts", None).await
}

pub(crate) async fn search_posts(query: &str) -> Result<Vec<Post>, ApiError> {
    let response = send(
        Request::get(&endpoint("/posts/search"))
            .query([("query", query)])
            .build(),
    )
    .await;

    match response {
        Ok(response) => parse_json(response).await,
        Err(err) if err.is_not_found() => Ok(Vec::new()),
        Err(err) => Err(err),
    }
}

pub(crate) async fn my_posts(token: &str) -> Result<Vec<Post>, ApiError> {
    get_json("/users/me/posts", Some(token)).await
}

pub(crate) async fn list_dialogues(token: &str) -> Result<Vec<Dialogue>, ApiError> {
    get_json("/chats", Some(token)).await
}

pub(crate) async fn chat_messages(
    token: &str,
    other_user_id: i64,
    post_id: i64,
) -> Result<Vec<ChatMessage>, ApiError> {
    get_json(&format!("/chats/{other_user_id}/{post_id}"), Some(token)).await
}

/// Отправляет сообщение. Тело ответа необязательно: если это не сообщение,
/// возвращается `None`.
pub(crate) async fn send_message(
    token: &str,
    message: &OutgoingMessage,
) -> Result<Option<ChatMessage>, ApiError> {
    let builder = authorized(Request::post(&endpoint("/chats/messages")), token);
    let response = send(builder.json(message)).await?;
    let body = response.text().await.unwrap_or_default();
    Ok(serde_json::from_str::<ChatMessage>(body.trim()).ok())
}
