//! Клиентская библиотека для REST API доски объявлений.
//!
//! Предоставляет единый API (`MarketClient`) поверх HTTP (`reqwest`):
//! объявления, профиль, чаты, отзывы, жалобы, верификация и модерация.
//!
//! Клиент хранит JWT-токен после `register`/`login`, автоматически использует
//! его в защищённых операциях и рассылает события сессии подписчикам
//! (`SessionEvents`) вместо глобальных событий браузера.
#![warn(missing_docs)]

mod api;
mod chat;
mod error;
mod http_client;
mod upload;

pub use api::ChatApi;
pub use chat::ChatController;
pub use error::{MarketClientError, MarketClientResult};
pub use http_client::{ClientConfig, HttpClient};
pub use upload::Upload;

pub use market_core as core;

use market_core::events::{SessionEvent, SessionEvents};
use market_core::forms::{
    BlockForm, ComplaintForm, LoginForm, NoticeForm, PasswordResetForm, ProfileForm, RegisterForm,
    ReviewForm,
};
use market_core::models::{
    AuthResponse, BlockedUser, Category, Complaint, Dialogue, Post, Review, SearchParams, User,
    VerificationRequest, VerificationStatus,
};
use market_core::session::{NavLink, SessionView, nav_links};
use validator::Validate;

#[derive(Debug, Clone)]
/// Унифицированный клиент доски объявлений.
pub struct MarketClient {
    http: HttpClient,
    token: Option<String>,
    events: SessionEvents,
}

impl MarketClient {
    /// Создаёт клиент по конфигурации.
    pub fn new(config: ClientConfig) -> MarketClientResult<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
            token: None,
            events: SessionEvents::new(),
        })
    }

    /// Издатель событий сессии этого клиента.
    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    /// Устанавливает JWT-токен вручную (например, восстановленный из хранилища).
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Возвращает текущий JWT-токен, если он установлен.
    pub fn get_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Очищает сохранённый JWT-токен.
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Состояние сессии по текущему токену.
    pub fn session(&self) -> SessionView {
        SessionView::from_token(self.get_token())
    }

    /// Ссылки навигации для текущей сессии.
    pub fn nav_links(&self) -> Vec<NavLink> {
        nav_links(&self.session())
    }

    /// Выполняет вход и сохраняет полученный JWT-токен в клиенте.
    pub async fn login(&mut self, form: &LoginForm) -> MarketClientResult<AuthResponse> {
        form.validate()?;
        let auth = self.http.login(form).await?;
        self.accept_token(&auth);
        Ok(auth)
    }

    /// Регистрирует пользователя и сохраняет полученный JWT-токен в клиенте.
    pub async fn register(&mut self, form: &RegisterForm) -> MarketClientResult<AuthResponse> {
        form.validate()?;
        let auth = self.http.register(form).await?;
        self.accept_token(&auth);
        Ok(auth)
    }

    /// Выход: токен забывается, подписчики получают `LoggedOut`.
    pub fn logout(&mut self) {
        if self.token.take().is_some() {
            tracing::info!("logged out");
        }
        self.events.publish(&SessionEvent::LoggedOut);
    }

    /// Запрашивает сброс пароля.
    pub async fn request_password_reset(&self, form: &PasswordResetForm) -> MarketClientResult<()> {
        form.validate()?;
        self.http.request_password_reset(form).await
    }

    /// Профиль текущего пользователя.
    ///
    /// Требует установленный JWT-токен.
    pub async fn current_user(&self) -> MarketClientResult<User> {
        let token = self.require_token()?;
        self.http.current_user(token).await
    }

    /// Обновляет профиль и рассылает `ProfileChanged`.
    ///
    /// Требует установленный JWT-токен.
    pub async fn update_profile(
        &self,
        form: &ProfileForm,
        avatar: Option<Upload>,
    ) -> MarketClientResult<User> {
        let token = self.require_token()?;
        form.validate()?;
        let user = self.http.update_profile(token, form, avatar).await?;
        self.events
            .publish(&SessionEvent::ProfileChanged { user: user.clone() });
        Ok(user)
    }

    /// Публичный профиль пользователя.
    pub async fn get_user(&self, id: i64) -> MarketClientResult<User> {
        self.http.get_user(id).await
    }

    /// Все категории.
    pub async fn categories(&self) -> MarketClientResult<Vec<Category>> {
        self.http.list_categories().await
    }

    /// Избранные категории.
    ///
    /// Требует установленный JWT-токен.
    pub async fn favorite_categories(&self) -> MarketClientResult<Vec<Category>> {
        let token = self.require_token()?;
        self.http.favorite_categories(token).await
    }

    /// Заменяет избранные категории.
    ///
    /// Требует установленный JWT-токен.
    pub async fn set_favorite_categories(&self, category_ids: &[i64]) -> MarketClientResult<()> {
        let token = self.require_token()?;
        self.http.set_favorite_categories(token, category_ids).await
    }

    /// Все объявления.
    pub async fn list_posts(&self) -> MarketClientResult<Vec<Post>> {
        self.http.list_posts().await
    }

    /// Поиск объявлений. Пустые параметры означают полный список.
    pub async fn search_posts(&self, params: &SearchParams) -> MarketClientResult<Vec<Post>> {
        if params.is_empty() {
            return self.http.list_posts().await;
        }
        self.http.search_posts(params).await
    }

    /// Объявление по идентификатору.
    pub async fn get_post(&self, id: i64) -> MarketClientResult<Post> {
        self.http.get_post(id).await
    }

    /// Создаёт объявление.
    ///
    /// Требует установленный JWT-токен.
    pub async fn create_post(
        &self,
        form: &NoticeForm,
        images: Vec<Upload>,
    ) -> MarketClientResult<Post> {
        let token = self.require_token()?;
        form.validate()?;
        self.http.create_post(token, form, images).await
    }

    /// Обновляет объявление.
    ///
    /// Требует установленный JWT-токен.
    pub async fn update_post(
        &self,
        id: i64,
        form: &NoticeForm,
        images: Vec<Upload>,
    ) -> MarketClientResult<Post> {
        let token = self.require_token()?;
        form.validate()?;
        self.http.update_post(token, id, form, images).await
    }

    /// Удаляет объявление.
    ///
    /// Требует установленный JWT-токен.
    pub async fn delete_post(&self, id: i64) -> MarketClientResult<()> {
        let token = self.require_token()?;
        self.http.delete_post(token, id).await
    }

    /// Закрывает (`true`) или переоткрывает (`false`) объявление.
    ///
    /// Требует установленный JWT-токен.
    pub async fn set_post_closed(&self, id: i64, closed: bool) -> MarketClientResult<()> {
        let token = self.require_token()?;
        self.http.set_post_closed(token, id, closed).await
    }

    /// Включает или выключает продвижение.
    ///
    /// Требует установленный JWT-токен.
    pub async fn set_post_promoted(&self, id: i64, promoted: bool) -> MarketClientResult<()> {
        let token = self.require_token()?;
        self.http.set_post_promoted(token, id, promoted).await
    }

    /// Объявления текущего пользователя.
    ///
    /// Требует установленный JWT-токен.
    pub async fn my_posts(&self) -> MarketClientResult<Vec<Post>> {
        let token = self.require_token()?;
        self.http.my_posts(token).await
    }

    /// Список диалогов.
    ///
    /// Требует установленный JWT-токен.
    pub async fn dialogues(&self) -> MarketClientResult<Vec<Dialogue>> {
        let token = self.require_token()?;
        self.http.list_dialogues(token).await
    }

    /// Открывает чат-контроллер для текущего пользователя.
    ///
    /// Id пользователя берётся из токена, а если его там нет, то из профиля.
    pub async fn chat(&self) -> MarketClientResult<ChatController<HttpClient>> {
        let token = self.require_token()?;
        let me = match self.session().user_id() {
            Some(id) => id,
            None => self.http.current_user(token).await?.id,
        };
        Ok(ChatController::new(self.http.clone(), token, me))
    }

    /// Оставляет отзыв.
    ///
    /// Требует установленный JWT-токен.
    pub async fn create_review(&self, form: &ReviewForm) -> MarketClientResult<Review> {
        let token = self.require_token()?;
        form.validate()?;
        self.http.create_review(token, form).await
    }

    /// Отзывы о пользователе.
    pub async fn user_reviews(&self, user_id: i64) -> MarketClientResult<Vec<Review>> {
        self.http.user_reviews(user_id).await
    }

    /// Подаёт жалобу.
    ///
    /// Требует установленный JWT-токен.
    pub async fn create_complaint(&self, form: &ComplaintForm) -> MarketClientResult<()> {
        let token = self.require_token()?;
        form.validate()?;
        self.http.create_complaint(token, form).await
    }

    /// Жалобы (модерация).
    pub async fn complaints(&self) -> MarketClientResult<Vec<Complaint>> {
        let token = self.require_staff()?;
        self.http.list_complaints(token).await
    }

    /// Пользователи (модерация).
    pub async fn users(&self) -> MarketClientResult<Vec<User>> {
        let token = self.require_staff()?;
        self.http.list_users(token).await
    }

    /// Блокирует пользователя (модерация).
    pub async fn block_user(&self, user_id: i64, form: &BlockForm) -> MarketClientResult<()> {
        let token = self.require_staff()?;
        form.validate()?;
        self.http.block_user(token, user_id, form).await
    }

    /// Снимает блокировку (модерация).
    pub async fn unblock_user(&self, user_id: i64) -> MarketClientResult<()> {
        let token = self.require_staff()?;
        self.http.unblock_user(token, user_id).await
    }

    /// Заблокированные пользователи (модерация).
    pub async fn blocked_users(&self) -> MarketClientResult<Vec<BlockedUser>> {
        let token = self.require_staff()?;
        self.http.blocked_users(token).await
    }

    /// Подаёт заявку на верификацию.
    ///
    /// Требует установленный JWT-токен и хотя бы одно фото.
    pub async fn submit_verification(&self, photos: Vec<Upload>) -> MarketClientResult<()> {
        let token = self.require_token()?;
        if photos.is_empty() {
            return Err(MarketClientError::InvalidRequest(
                "at least one photo is required".to_string(),
            ));
        }
        self.http.submit_verification(token, photos).await
    }

    /// Заявки на верификацию (модерация).
    pub async fn verification_requests(&self) -> MarketClientResult<Vec<VerificationRequest>> {
        let token = self.require_staff()?;
        self.http.list_verification_requests(token).await
    }

    /// Решение по заявке на верификацию (модерация).
    pub async fn respond_verification(
        &self,
        request_id: i64,
        status: VerificationStatus,
    ) -> MarketClientResult<()> {
        let token = self.require_staff()?;
        if status == VerificationStatus::Pending {
            return Err(MarketClientError::InvalidRequest(
                "decision must be approved or rejected".to_string(),
            ));
        }
        self.http
            .respond_verification(token, request_id, status)
            .await
    }

    fn accept_token(&mut self, auth: &AuthResponse) {
        self.token = Some(auth.token.clone());
        tracing::info!("session started");
        self.events.publish(&SessionEvent::LoggedIn {
            token: auth.token.clone(),
        });
    }

    fn require_token(&self) -> MarketClientResult<&str> {
        self.token.as_deref().ok_or(MarketClientError::Unauthorized)
    }

    /// Модерация доступна только staff-ролям; окончательно права проверяет backend.
    fn require_staff(&self) -> MarketClientResult<&str> {
        let token = self.require_token()?;
        if !self.session().is_staff() {
            return Err(MarketClientError::Unauthorized);
        }
        Ok(token)
    }
}
