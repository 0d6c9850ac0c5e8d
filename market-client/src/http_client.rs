use async_trait::async_trait;
use market_core::forms::{
    BlockForm, ComplaintForm, LoginForm, NoticeForm, PasswordResetForm, ProfileForm, RegisterForm,
    ReviewForm, VerificationDecision,
};
use market_core::models::{
    AuthResponse, BlockedUser, Category, ChatMessage, Complaint, Dialogue, OutgoingMessage, Post,
    Review, SearchParams, User, VerificationRequest, VerificationStatus,
};
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;

use crate::api::ChatApi;
use crate::error::{MarketClientError, MarketClientResult};
use crate::upload::Upload;

#[derive(Debug, Deserialize)]
struct ErrorResponseDto {
    error: Option<String>,
    message: Option<String>,
}

impl ErrorResponseDto {
    fn into_message(self) -> Option<String> {
        self.error
            .or(self.message)
            .map(|msg| msg.trim().to_string())
            .filter(|msg| !msg.is_empty())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FavoriteCategoriesDto<'a> {
    category_ids: &'a [i64],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClosedFlagDto {
    is_closed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PromotedFlagDto {
    is_promoted: bool,
}

/// Ответ на отправку сообщения бывает пустым или без id.
fn parse_sent_message(body: &str) -> Option<ChatMessage> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    serde_json::from_str::<ChatMessage>(body).ok()
}

fn notice_multipart(form: &NoticeForm, images: Vec<Upload>) -> MarketClientResult<Form> {
    let tags = serde_json::to_string(&form.tags)
        .map_err(|err| MarketClientError::InvalidRequest(format!("invalid tags: {err}")))?;

    let mut multipart = Form::new()
        .text("title", form.title.trim().to_string())
        .text("caption", form.caption.trim().to_string())
        .text("price", form.price.to_string())
        .text("currency", form.currency.to_ascii_uppercase())
        .text("tags", tags);
    if let Some(category_id) = form.category_id {
        multipart = multipart.text("categoryId", category_id.to_string());
    }
    for image in images {
        multipart = multipart.part("images", image.into_part()?);
    }
    Ok(multipart)
}

fn profile_multipart(form: &ProfileForm, avatar: Option<Upload>) -> MarketClientResult<Form> {
    let mut multipart = Form::new();
    if let Some(name) = &form.name {
        multipart = multipart.text("name", name.trim().to_string());
    }
    if let Some(surname) = &form.surname {
        multipart = multipart.text("surname", surname.trim().to_string());
    }
    if let Some(phone) = &form.phone {
        multipart = multipart.text("phone", phone.trim().to_string());
    }
    if let Some(avatar) = avatar {
        multipart = multipart.part("avatar", avatar.into_part()?);
    }
    Ok(multipart)
}

#[derive(Debug, Clone)]
/// Параметры подключения к backend.
pub struct ClientConfig {
    /// Базовый URL REST API, например `http://127.0.0.1:8080/api`.
    pub base_url: String,
    /// Таймаут установки соединения.
    pub connect_timeout: Duration,
    /// Таймаут всего запроса.
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Конфигурация с таймаутами по умолчанию (5 с на соединение, 15 с на запрос).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone)]
/// HTTP-клиент для REST API доски объявлений.
pub struct HttpClient {
    base_url: String,
    client: Client,
}

impl HttpClient {
    /// Создаёт клиент по конфигурации.
    pub fn new(config: ClientConfig) -> MarketClientResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            base_url: config.base_url,
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        tracing::debug!(%method, path, authorized = token.is_some(), "sending request");

        let mut request = self.client.request(method, self.endpoint(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn decode_error(response: Response) -> MarketClientError {
        let status = response.status();
        let url = response.url().path().to_string();

        let message = response
            .json::<ErrorResponseDto>()
            .await
            .ok()
            .and_then(ErrorResponseDto::into_message)
            .unwrap_or_else(|| format!("http status {status}"));

        tracing::warn!(%status, path = %url, error = %message, "request failed");
        MarketClientError::from_http_status(status, Some(message))
    }

    async fn execute(request: RequestBuilder) -> MarketClientResult<Response> {
        let response = request
            .send()
            .await
            .map_err(MarketClientError::from_reqwest)?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }
        Ok(response)
    }

    async fn read_json<TRes: DeserializeOwned>(response: Response) -> MarketClientResult<TRes> {
        response
            .json::<TRes>()
            .await
            .map_err(MarketClientError::from_reqwest)
    }

    async fn get_json<TRes: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> MarketClientResult<TRes> {
        let response = Self::execute(self.request(Method::GET, path, token)).await?;
        Self::read_json(response).await
    }

    /// универсальный helper для отправки запросов с json-payload
    async fn send_json<TReq, TRes>(
        &self,
        method: Method,
        path: &str,
        body: &TReq,
        token: Option<&str>,
    ) -> MarketClientResult<TRes>
    where
        TReq: Serialize + ?Sized,
        TRes: DeserializeOwned,
    {
        let request = self.request(method, path, token).json(body);
        let response = Self::execute(request).await?;
        Self::read_json(response).await
    }

    /// То же, что `send_json`, но тело ответа не читается.
    async fn send_json_no_content<TReq>(
        &self,
        method: Method,
        path: &str,
        body: &TReq,
        token: Option<&str>,
    ) -> MarketClientResult<()>
    where
        TReq: Serialize + ?Sized,
    {
        let request = self.request(method, path, token).json(body);
        Self::execute(request).await?;
        Ok(())
    }

    async fn send_empty(&self, method: Method, path: &str, token: &str) -> MarketClientResult<()> {
        Self::execute(self.request(method, path, Some(token))).await?;
        Ok(())
    }

    async fn send_multipart<TRes: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: Form,
        token: &str,
    ) -> MarketClientResult<TRes> {
        let request = self.request(method, path, Some(token)).multipart(form);
        let response = Self::execute(request).await?;
        Self::read_json(response).await
    }

    /// Вход по email и паролю.
    pub async fn login(&self, form: &LoginForm) -> MarketClientResult<AuthResponse> {
        self.send_json(Method::POST, "/auth/login", form, None).await
    }

    /// Регистрация нового пользователя.
    pub async fn register(&self, form: &RegisterForm) -> MarketClientResult<AuthResponse> {
        self.send_json(Method::POST, "/auth/register", form, None)
            .await
    }

    /// Отправляет письмо для сброса пароля.
    pub async fn request_password_reset(&self, form: &PasswordResetForm) -> MarketClientResult<()> {
        self.send_json_no_content(Method::POST, "/auth/password-reset", form, None)
            .await
    }

    /// Профиль текущего пользователя.
    pub async fn current_user(&self, token: &str) -> MarketClientResult<User> {
        self.get_json("/users/me", Some(token)).await
    }

    /// Обновляет профиль (multipart, аватар необязателен).
    pub async fn update_profile(
        &self,
        token: &str,
        form: &ProfileForm,
        avatar: Option<Upload>,
    ) -> MarketClientResult<User> {
        let multipart = profile_multipart(form, avatar)?;
        self.send_multipart(Method::PUT, "/users/me", multipart, token)
            .await
    }

    /// Публичный профиль пользователя.
    pub async fn get_user(&self, id: i64) -> MarketClientResult<User> {
        self.get_json(&format!("/users/{id}"), None).await
    }

    /// Все категории.
    pub async fn list_categories(&self) -> MarketClientResult<Vec<Category>> {
        self.get_json("/categories", None).await
    }

    /// Избранные категории текущего пользователя.
    pub async fn favorite_categories(&self, token: &str) -> MarketClientResult<Vec<Category>> {
        self.get_json("/users/me/favorite-categories", Some(token))
            .await
    }

    /// Заменяет список избранных категорий.
    pub async fn set_favorite_categories(
        &self,
        token: &str,
        category_ids: &[i64],
    ) -> MarketClientResult<()> {
        let payload = FavoriteCategoriesDto { category_ids };
        self.send_json_no_content(
            Method::PUT,
            "/users/me/favorite-categories",
            &payload,
            Some(token),
        )
        .await
    }

    /// Все объявления.
    pub async fn list_posts(&self) -> MarketClientResult<Vec<Post>> {
        self.get_json("/posts", None).await
    }

    /// Серверный поиск объявлений. Ответ 404 означает пустой список.
    pub async fn search_posts(&self, params: &SearchParams) -> MarketClientResult<Vec<Post>> {
        let request = self.request(Method::GET, "/posts/search", None).query(params);
        let response = match Self::execute(request).await {
            Ok(response) => response,
            Err(MarketClientError::NotFound) => {
                tracing::debug!("search returned no posts");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };
        Self::read_json(response).await
    }

    /// Объявление по идентификатору.
    pub async fn get_post(&self, id: i64) -> MarketClientResult<Post> {
        self.get_json(&format!("/posts/{id}"), None).await
    }

    /// Создаёт объявление с картинками.
    pub async fn create_post(
        &self,
        token: &str,
        form: &NoticeForm,
        images: Vec<Upload>,
    ) -> MarketClientResult<Post> {
        let multipart = notice_multipart(form, images)?;
        self.send_multipart(Method::POST, "/posts", multipart, token)
            .await
    }

    /// Обновляет объявление. Новые картинки заменяют старые, если переданы.
    pub async fn update_post(
        &self,
        token: &str,
        id: i64,
        form: &NoticeForm,
        images: Vec<Upload>,
    ) -> MarketClientResult<Post> {
        let multipart = notice_multipart(form, images)?;
        self.send_multipart(Method::PUT, &format!("/posts/{id}"), multipart, token)
            .await
    }

    /// Удаляет объявление.
    pub async fn delete_post(&self, token: &str, id: i64) -> MarketClientResult<()> {
        self.send_empty(Method::DELETE, &format!("/posts/{id}"), token)
            .await
    }

    /// Закрывает или переоткрывает объявление.
    pub async fn set_post_closed(
        &self,
        token: &str,
        id: i64,
        closed: bool,
    ) -> MarketClientResult<()> {
        let payload = ClosedFlagDto { is_closed: closed };
        self.send_json_no_content(
            Method::PATCH,
            &format!("/posts/{id}/close"),
            &payload,
            Some(token),
        )
        .await
    }

    /// Включает или выключает продвижение объявления.
    pub async fn set_post_promoted(
        &self,
        token: &str,
        id: i64,
        promoted: bool,
    ) -> MarketClientResult<()> {
        let payload = PromotedFlagDto {
            is_promoted: promoted,
        };
        self.send_json_no_content(
            Method::PATCH,
            &format!("/posts/{id}/promote"),
            &payload,
            Some(token),
        )
        .await
    }

    /// Объявления текущего пользователя.
    pub async fn my_posts(&self, token: &str) -> MarketClientResult<Vec<Post>> {
        self.get_json("/users/me/posts", Some(token)).await
    }

    /// Оставляет отзыв о пользователе.
    pub async fn create_review(&self, token: &str, form: &ReviewForm) -> MarketClientResult<Review> {
        self.send_json(Method::POST, "/reviews", form, Some(token))
            .await
    }

    /// Отзывы о пользователе.
    pub async fn user_reviews(&self, user_id: i64) -> MarketClientResult<Vec<Review>> {
        self.get_json(&format!("/users/{user_id}/reviews"), None)
            .await
    }

    /// Подаёт жалобу.
    pub async fn create_complaint(
        &self,
        token: &str,
        form: &ComplaintForm,
    ) -> MarketClientResult<()> {
        self.send_json_no_content(Method::POST, "/complaints", form, Some(token))
            .await
    }

    /// Все жалобы (модерация).
    pub async fn list_complaints(&self, token: &str) -> MarketClientResult<Vec<Complaint>> {
        self.get_json("/admin/complaints", Some(token)).await
    }

    /// Все пользователи (модерация).
    pub async fn list_users(&self, token: &str) -> MarketClientResult<Vec<User>> {
        self.get_json("/admin/users", Some(token)).await
    }

    /// Блокирует пользователя.
    pub async fn block_user(
        &self,
        token: &str,
        user_id: i64,
        form: &BlockForm,
    ) -> MarketClientResult<()> {
        self.send_json_no_content(
            Method::POST,
            &format!("/admin/users/{user_id}/block"),
            form,
            Some(token),
        )
        .await
    }

    /// Снимает блокировку.
    pub async fn unblock_user(&self, token: &str, user_id: i64) -> MarketClientResult<()> {
        self.send_empty(Method::DELETE, &format!("/admin/users/{user_id}/block"), token)
            .await
    }

    /// Заблокированные пользователи.
    pub async fn blocked_users(&self, token: &str) -> MarketClientResult<Vec<BlockedUser>> {
        self.get_json("/admin/users/blocked", Some(token)).await
    }

    /// Подаёт заявку на верификацию с фотографиями.
    pub async fn submit_verification(
        &self,
        token: &str,
        photos: Vec<Upload>,
    ) -> MarketClientResult<()> {
        let mut multipart = Form::new();
        for photo in photos {
            multipart = multipart.part("images", photo.into_part()?);
        }
        let request = self
            .request(Method::POST, "/verification", Some(token))
            .multipart(multipart);
        Self::execute(request).await?;
        Ok(())
    }

    /// Заявки на верификацию (модерация).
    pub async fn list_verification_requests(
        &self,
        token: &str,
    ) -> MarketClientResult<Vec<VerificationRequest>> {
        self.get_json("/admin/verification", Some(token)).await
    }

    /// Одобряет или отклоняет заявку.
    pub async fn respond_verification(
        &self,
        token: &str,
        request_id: i64,
        status: VerificationStatus,
    ) -> MarketClientResult<()> {
        let payload = VerificationDecision { status };
        self.send_json_no_content(
            Method::PATCH,
            &format!("/admin/verification/{request_id}"),
            &payload,
            Some(token),
        )
        .await
    }
}

#[async_trait]
impl ChatApi for HttpClient {
    async fn list_dialogues(&self, token: &str) -> MarketClientResult<Vec<Dialogue>> {
        self.get_json("/chats", Some(token)).await
    }

    async fn chat_messages(
        &self,
        token: &str,
        other_user_id: i64,
        post_id: i64,
    ) -> MarketClientResult<Vec<ChatMessage>> {
        self.get_json(&format!("/chats/{other_user_id}/{post_id}"), Some(token))
            .await
    }

    async fn send_message(
        &self,
        token: &str,
        message: &OutgoingMessage,
    ) -> MarketClientResult<Option<ChatMessage>> {
        let request = self
            .request(Method::POST, "/chats/messages", Some(token))
            .json(message);
        let response = Self::execute(request).await?;
        let body = response
            .text()
            .await
            .map_err(MarketClientError::from_reqwest)?;
        Ok(parse_sent_message(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn test_client(base_url: String) -> HttpClient {
        HttpClient {
            base_url,
            client: Client::builder()
                .no_proxy()
                .build()
                .expect("client must build"),
        }
    }

    /// Отвечает на один запрос заготовленным ответом.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener must bind");
        let addr = listener.local_addr().expect("listener must have address");

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("must accept");
            let mut buf = vec![0u8; 16 * 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });

        format!("http://{addr}/api")
    }

    #[test]
    fn endpoint_normalizes_slashes() {
        let client =
            HttpClient::new(ClientConfig::new("http://localhost:8080/api/")).expect("must build");
        let full = client.endpoint("/posts/7");
        assert_eq!(full, "http://localhost:8080/api/posts/7");
    }

    #[test]
    fn error_body_prefers_error_then_message() {
        let dto = ErrorResponseDto {
            error: Some("bad".to_string()),
            message: Some("ignored".to_string()),
        };
        assert_eq!(dto.into_message().as_deref(), Some("bad"));

        let dto = ErrorResponseDto {
            error: None,
            message: Some(" title is required ".to_string()),
        };
        assert_eq!(dto.into_message().as_deref(), Some("title is required"));

        let dto = ErrorResponseDto {
            error: Some("  ".to_string()),
            message: None,
        };
        assert!(dto.into_message().is_none());
    }

    #[test]
    fn parse_sent_message_handles_empty_and_partial_bodies() {
        assert!(parse_sent_message("").is_none());
        assert!(parse_sent_message("not json").is_none());

        let echo = parse_sent_message(r#"{"success": true}"#).expect("object must parse");
        assert!(echo.id.is_none());

        let echo = parse_sent_message(r#"{"id": 15, "message": "hi", "createdAt": "2024-01-01T00:00:00Z"}"#)
            .expect("message must parse");
        assert_eq!(echo.id, Some(15));
        assert!(echo.created_at.is_some());
    }

    #[test]
    fn notice_multipart_builds_with_images() {
        let form = NoticeForm {
            title: "Bike".to_string(),
            caption: "Red".to_string(),
            price: 10.0,
            currency: "usd".to_string(),
            category_id: Some(2),
            tags: vec!["sport".to_string()],
        };
        let images = vec![Upload::new("a.jpg", "image/jpeg", vec![0xff, 0xd8])];
        assert!(notice_multipart(&form, images).is_ok());

        let broken = vec![Upload::new("a.bin", "not a mime", vec![])];
        assert!(notice_multipart(&form, broken).is_err());
    }

    #[tokio::test]
    async fn search_posts_treats_not_found_as_empty() {
        let base_url = serve_once("404 Not Found", r#"{"error":"nothing found"}"#).await;
        let client = test_client(base_url);

        let params = SearchParams {
            query: Some("unicorn".to_string()),
            ..Default::default()
        };
        let posts = client
            .search_posts(&params)
            .await
            .expect("404 must map to empty result");
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn get_post_keeps_not_found_as_error() {
        let base_url = serve_once("404 Not Found", r#"{"error":"no such post"}"#).await;
        let client = test_client(base_url);

        let err = client.get_post(99).await.expect_err("must fail");
        assert!(matches!(err, MarketClientError::NotFound));
    }

    #[tokio::test]
    async fn server_error_message_is_surfaced() {
        let base_url = serve_once("400 Bad Request", r#"{"message":"price must be positive"}"#).await;
        let client = test_client(base_url);

        let err = client.list_posts().await.expect_err("must fail");
        match err {
            MarketClientError::InvalidRequest(msg) => assert_eq!(msg, "price must be positive"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_posts_decodes_array() {
        let base_url = serve_once(
            "200 OK",
            r#"[{"id":1,"title":"Bike","price":"10","images":"[\"QUJD\"]"},{"id":2,"title":"Lamp"}]"#,
        )
        .await;
        let client = test_client(base_url);

        let posts = client.list_posts().await.expect("must decode");
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].price, Some(10.0));
        assert_eq!(posts[0].image_urls(), vec!["data:image/jpeg;base64,QUJD".to_string()]);
    }
}
