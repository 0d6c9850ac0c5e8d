//! Записи, которые отдаёт backend. Клиент не проверяет их целостность:
//! все инварианты обеспечивает сервер, здесь только защита от
//! отсутствующих/`null` полей.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::images;

/// Десериализует `null` как значение по умолчанию.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Цена приходит то числом, то строкой (`"1500"`, `"99.90"`).
fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPrice {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<RawPrice>::deserialize(deserializer)? {
        Some(RawPrice::Number(value)) => Some(value),
        Some(RawPrice::Text(text)) => text.trim().parse::<f64>().ok(),
        None => None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
/// Роль пользователя.
pub enum Role {
    /// Обычный пользователь.
    #[default]
    User,
    /// Модератор.
    Moderator,
    /// Администратор.
    Admin,
}

impl Role {
    /// Есть ли у роли доступ к панели модерации.
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Moderator | Self::Admin)
    }

    /// Строковое имя роли в API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Self::Admin,
            "moderator" => Self::Moderator,
            _ => Self::User,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Полный профиль пользователя.
pub struct User {
    /// Идентификатор пользователя.
    pub id: i64,
    /// Имя.
    pub name: String,
    /// Фамилия.
    pub surname: Option<String>,
    /// Телефон.
    pub phone: Option<String>,
    /// Email.
    pub email: String,
    /// Аватар (base64 или URL).
    pub avatar: Option<String>,
    /// Роль.
    #[serde(deserialize_with = "nullable")]
    pub role: Role,
    /// Пройдена ли верификация личности.
    #[serde(deserialize_with = "nullable")]
    pub is_verified: bool,
    /// Заблокирован ли пользователь.
    #[serde(deserialize_with = "nullable")]
    pub is_blocked: bool,
    /// Дата регистрации.
    pub created_at: Option<DateTime<Utc>>,
    /// Дата последнего изменения профиля.
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Имя и фамилия через пробел.
    pub fn display_name(&self) -> String {
        match self.surname.as_deref().map(str::trim) {
            Some(surname) if !surname.is_empty() => format!("{} {surname}", self.name),
            _ => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Краткие данные пользователя, встроенные в другие записи.
pub struct UserSummary {
    /// Идентификатор пользователя.
    pub id: i64,
    /// Имя.
    pub name: String,
    /// Фамилия.
    pub surname: Option<String>,
    /// Аватар.
    pub avatar: Option<String>,
    /// Пройдена ли верификация.
    #[serde(deserialize_with = "nullable")]
    pub is_verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Категория объявлений.
pub struct Category {
    /// Идентификатор категории.
    pub id: i64,
    /// Название.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
/// Категория объявления: либо только id, либо вложенный объект.
pub enum CategoryRef {
    /// Только идентификатор.
    Id(i64),
    /// Вложенная категория.
    Category(Category),
}

impl CategoryRef {
    /// Идентификатор категории.
    pub fn id(&self) -> i64 {
        match self {
            Self::Id(id) => *id,
            Self::Category(category) => category.id,
        }
    }

    /// Название категории, если backend его прислал.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::Category(category) => Some(&category.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
/// Владелец объявления: либо id, либо вложенный пользователь.
pub enum OwnerRef {
    /// Только идентификатор.
    Id(i64),
    /// Вложенный пользователь.
    User(UserSummary),
}

impl OwnerRef {
    /// Идентификатор владельца.
    pub fn id(&self) -> i64 {
        match self {
            Self::Id(id) => *id,
            Self::User(user) => user.id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
/// Картинки объявления в виде base64-строк.
///
/// Backend присылает либо JSON-массив строк, либо строку, внутри которой
/// лежит JSON-массив. Нераспознанная строка превращается в пустой список.
pub struct Images(pub Vec<String>);

impl Images {
    /// Сырые base64-строки.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Пустой ли список.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Полные data-URL для каждой картинки.
    pub fn urls(&self) -> Vec<String> {
        self.0.iter().map(|entry| images::to_data_url(entry)).collect()
    }
}

impl<'de> Deserialize<'de> for Images {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawImages {
            List(Vec<String>),
            Encoded(String),
        }

        Ok(match Option::<RawImages>::deserialize(deserializer)? {
            Some(RawImages::List(list)) => Self(list),
            Some(RawImages::Encoded(raw)) => Self(images::parse_image_list(&raw)),
            None => Self::default(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Объявление.
pub struct Post {
    /// Идентификатор объявления.
    pub id: i64,
    /// Заголовок.
    pub title: String,
    /// Описание.
    pub caption: Option<String>,
    /// Цена.
    #[serde(deserialize_with = "lenient_price")]
    pub price: Option<f64>,
    /// Валюта (`RUB`, `USD`, ...).
    pub currency: Option<String>,
    /// Картинки.
    pub images: Images,
    /// Теги.
    #[serde(deserialize_with = "nullable")]
    pub tags: Vec<String>,
    /// Категория.
    pub category: Option<CategoryRef>,
    /// Количество просмотров.
    pub views: Option<u64>,
    /// Продвигается ли объявление.
    #[serde(deserialize_with = "nullable")]
    pub is_promoted: bool,
    /// Закрыто ли объявление.
    #[serde(deserialize_with = "nullable")]
    pub is_closed: bool,
    /// Владелец.
    pub owner: Option<OwnerRef>,
    /// Дата создания.
    pub created_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Полные data-URL всех картинок.
    pub fn image_urls(&self) -> Vec<String> {
        self.images.urls()
    }

    /// Идентификатор владельца, если он известен.
    pub fn owner_id(&self) -> Option<i64> {
        self.owner.as_ref().map(OwnerRef::id)
    }

    /// Идентификатор категории, если он известен.
    pub fn category_id(&self) -> Option<i64> {
        self.category.as_ref().map(CategoryRef::id)
    }

    /// Цена вместе с валютой для отображения.
    pub fn price_label(&self) -> String {
        match (self.price, self.currency.as_deref()) {
            (Some(price), Some(currency)) => format!("{price} {currency}"),
            (Some(price), None) => price.to_string(),
            (None, _) => "-".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Краткие данные объявления внутри диалога.
pub struct PostSummary {
    /// Идентификатор объявления.
    pub id: i64,
    /// Заголовок.
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
/// Объявление, к которому привязан диалог.
pub enum PostRef {
    /// Только идентификатор.
    Id(i64),
    /// Вложенные данные.
    Post(PostSummary),
}

impl PostRef {
    /// Идентификатор объявления.
    pub fn id(&self) -> i64 {
        match self {
            Self::Id(id) => *id,
            Self::Post(post) => post.id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Диалог двух пользователей по конкретному объявлению.
pub struct Dialogue {
    /// Идентификатор диалога.
    pub id: i64,
    /// Участники.
    #[serde(deserialize_with = "nullable")]
    pub participants: Vec<UserSummary>,
    /// Объявление.
    pub post: Option<PostRef>,
    /// Текст последнего сообщения.
    pub last_message: Option<String>,
    /// Время последней активности.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Dialogue {
    /// Собеседник текущего пользователя.
    pub fn counterpart(&self, me: i64) -> Option<&UserSummary> {
        self.participants.iter().find(|user| user.id != me)
    }

    /// Идентификатор объявления диалога.
    pub fn post_id(&self) -> Option<i64> {
        self.post.as_ref().map(PostRef::id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Сообщение в диалоге.
pub struct ChatMessage {
    /// Идентификатор. Может отсутствовать в ответе на отправку.
    pub id: Option<i64>,
    /// Отправитель.
    pub sender_id: i64,
    /// Получатель.
    pub receiver_id: i64,
    /// Объявление.
    pub post_id: i64,
    /// Текст сообщения.
    #[serde(alias = "text", deserialize_with = "nullable")]
    pub message: String,
    /// Время отправки.
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
/// Тело запроса на отправку сообщения.
pub struct OutgoingMessage {
    /// Получатель.
    pub receiver_id: i64,
    /// Объявление.
    pub post_id: i64,
    /// Текст.
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Отзыв о пользователе.
pub struct Review {
    /// Идентификатор отзыва.
    pub id: Option<i64>,
    /// Идентификатор автора.
    pub author_id: Option<i64>,
    /// Автор (если backend встроил его в ответ).
    pub author: Option<UserSummary>,
    /// О ком отзыв.
    pub target_user_id: Option<i64>,
    /// Оценка 1..=5.
    pub rating: u8,
    /// Текст.
    #[serde(deserialize_with = "nullable")]
    pub text: String,
    /// Дата создания.
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Жалоба на объявление или пользователя.
pub struct Complaint {
    /// Идентификатор жалобы.
    pub id: Option<i64>,
    /// Текст жалобы.
    #[serde(deserialize_with = "nullable")]
    pub message: String,
    /// Объявление, на которое жалуются.
    pub post_id: Option<i64>,
    /// Пользователь, на которого жалуются.
    pub user_id: Option<i64>,
    /// Автор жалобы.
    pub author_id: Option<i64>,
    /// Дата создания.
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Статус заявки на верификацию.
pub enum VerificationStatus {
    /// Ожидает рассмотрения.
    #[default]
    Pending,
    /// Одобрена.
    Approved,
    /// Отклонена.
    Rejected,
}

impl VerificationStatus {
    /// Строковое имя статуса в API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Заявка на верификацию личности.
pub struct VerificationRequest {
    /// Идентификатор заявки.
    pub id: i64,
    /// Заявитель.
    pub user_id: Option<i64>,
    /// Данные заявителя.
    pub user: Option<UserSummary>,
    /// Фотографии.
    pub images: Images,
    /// Статус.
    #[serde(deserialize_with = "nullable")]
    pub status: VerificationStatus,
    /// Дата подачи.
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Заблокированный пользователь.
pub struct BlockedUser {
    /// Данные пользователя.
    #[serde(flatten)]
    pub user: UserSummary,
    /// Причина блокировки.
    pub block_reason: Option<String>,
    /// Время блокировки.
    pub blocked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Ответ после успешного входа или регистрации.
pub struct AuthResponse {
    /// JWT access token.
    #[serde(alias = "accessToken", alias = "access_token")]
    pub token: String,
    /// Профиль, если backend вернул его вместе с токеном.
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
/// Параметры серверного поиска объявлений.
pub struct SearchParams {
    /// Строка поиска.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Категория.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    /// Минимальная цена.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    /// Максимальная цена.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
}

impl SearchParams {
    /// Не задан ни один параметр.
    pub fn is_empty(&self) -> bool {
        self.query.as_deref().is_none_or(|q| q.trim().is_empty())
            && self.category_id.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_accepts_encoded_images_and_string_price() {
        let raw = r#"{
            "id": 7,
            "title": "Bike",
            "price": "1500",
            "images": "[\"AAAA\", \"data:image/png;base64,BBBB\"]",
            "tags": null,
            "category": {"id": 3, "name": "Sport"},
            "owner": 12,
            "createdAt": "2024-05-01T10:00:00Z"
        }"#;

        let post: Post = serde_json::from_str(raw).expect("post must parse");
        assert_eq!(post.id, 7);
        assert_eq!(post.price, Some(1500.0));
        assert!(post.tags.is_empty());
        assert_eq!(post.category_id(), Some(3));
        assert_eq!(post.owner_id(), Some(12));
        assert_eq!(
            post.image_urls(),
            vec![
                "data:image/jpeg;base64,AAAA".to_string(),
                "data:image/png;base64,BBBB".to_string(),
            ]
        );
    }

    #[test]
    fn post_accepts_image_array_and_missing_fields() {
        let raw = r#"{"id": 1, "title": "Lamp", "images": ["CCCC"], "price": 20}"#;
        let post: Post = serde_json::from_str(raw).expect("post must parse");
        assert_eq!(post.images.as_slice(), ["CCCC".to_string()]);
        assert_eq!(post.price, Some(20.0));
        assert!(post.views.is_none());
        assert!(!post.is_closed);
        assert!(post.owner.is_none());
    }

    #[test]
    fn post_with_garbage_image_string_has_no_images() {
        let raw = r#"{"id": 1, "title": "Lamp", "images": "not json"}"#;
        let post: Post = serde_json::from_str(raw).expect("post must parse");
        assert!(post.images.is_empty());
    }

    #[test]
    fn unknown_role_falls_back_to_user() {
        let user: User =
            serde_json::from_str(r#"{"id": 1, "name": "A", "email": "a@b.c", "role": "owner"}"#)
                .expect("user must parse");
        assert_eq!(user.role, Role::User);

        let admin: User =
            serde_json::from_str(r#"{"id": 2, "name": "B", "email": "b@b.c", "role": "ADMIN"}"#)
                .expect("user must parse");
        assert_eq!(admin.role, Role::Admin);
        assert!(admin.role.is_staff());
    }

    #[test]
    fn blocked_user_flattens_summary() {
        let raw = r#"{"id": 5, "name": "Eve", "blockReason": "spam", "blockedAt": "2024-01-02T03:04:05Z"}"#;
        let blocked: BlockedUser = serde_json::from_str(raw).expect("blocked user must parse");
        assert_eq!(blocked.user.id, 5);
        assert_eq!(blocked.block_reason.as_deref(), Some("spam"));
        assert!(blocked.blocked_at.is_some());
    }

    #[test]
    fn dialogue_counterpart_skips_current_user() {
        let dialogue = Dialogue {
            id: 1,
            participants: vec![
                UserSummary {
                    id: 1,
                    name: "me".to_string(),
                    ..Default::default()
                },
                UserSummary {
                    id: 2,
                    name: "other".to_string(),
                    ..Default::default()
                },
            ],
            post: Some(PostRef::Id(9)),
            ..Default::default()
        };

        assert_eq!(dialogue.counterpart(1).map(|u| u.id), Some(2));
        assert_eq!(dialogue.post_id(), Some(9));
    }

    #[test]
    fn auth_response_accepts_access_token_alias() {
        let auth: AuthResponse =
            serde_json::from_str(r#"{"accessToken": "jwt"}"#).expect("auth must parse");
        assert_eq!(auth.token, "jwt");
        assert!(auth.user.is_none());
    }

    #[test]
    fn search_params_skip_empty_fields() {
        let params = SearchParams {
            query: Some("bike".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&params).expect("params must serialize");
        assert_eq!(json, serde_json::json!({"query": "bike"}));
        assert!(!params.is_empty());
        assert!(SearchParams::default().is_empty());
    }
}
