//! Локальный разбор JWT-сессии для показа ссылок навигации.
//!
//! Подпись здесь не проверяется, это задача backend. Клиенту нужны только
//! claims `role` и `isVerified`; любой сбой разбора означает "нет сессии".

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::models::{Role, nullable};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Int(i64),
    Float(f64),
    Text(String),
    Other(#[allow(dead_code)] serde_json::Value),
}

/// Id бывает числом или строкой; всё остальное считается отсутствующим.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawNumber>::deserialize(deserializer)? {
        Some(RawNumber::Int(value)) => Some(value),
        Some(RawNumber::Float(value)) if value.is_finite() && value.fract() == 0.0 => {
            Some(value as i64)
        }
        Some(RawNumber::Text(text)) => text.trim().parse::<i64>().ok(),
        _ => None,
    })
}

/// `exp` может быть дробным числом секунд.
fn lenient_exp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = match Option::<RawNumber>::deserialize(deserializer)? {
        Some(RawNumber::Int(value)) => return Ok(Some(value)),
        Some(RawNumber::Float(value)) => Some(value),
        Some(RawNumber::Text(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(seconds
        .filter(|value| value.is_finite())
        .map(|value| value.floor() as i64))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Claims из payload токена, которые интересны клиенту.
pub struct SessionClaims {
    /// Идентификатор пользователя.
    #[serde(alias = "userId", deserialize_with = "lenient_id")]
    pub id: Option<i64>,
    /// Роль.
    #[serde(deserialize_with = "nullable")]
    pub role: Role,
    /// Пройдена ли верификация.
    #[serde(alias = "is_verified", deserialize_with = "nullable")]
    pub is_verified: bool,
    /// Время истечения (unix seconds).
    #[serde(deserialize_with = "lenient_exp")]
    pub exp: Option<i64>,
}

fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    let normalized: String = segment
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    URL_SAFE_NO_PAD.decode(normalized).ok()
}

/// Декодирует payload токена без проверки подписи.
pub fn decode_claims(token: &str) -> Option<SessionClaims> {
    let mut segments = token.trim().split('.');
    let _header = segments.next()?;
    let payload = segments.next()?;
    if payload.is_empty() {
        return None;
    }
    let bytes = decode_segment(payload)?;
    serde_json::from_slice(&bytes).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Состояние сессии с точки зрения интерфейса.
pub enum SessionView {
    /// Токена нет или он не разбирается.
    #[default]
    LoggedOut,
    /// Пользователь вошёл.
    LoggedIn {
        /// Идентификатор пользователя, если он есть в токене.
        user_id: Option<i64>,
        /// Роль.
        role: Role,
        /// Пройдена ли верификация.
        verified: bool,
    },
}

impl SessionView {
    /// Состояние сессии по сохранённому токену на текущий момент.
    pub fn from_token(token: Option<&str>) -> Self {
        Self::from_token_at(token, Utc::now())
    }

    /// Состояние сессии по токену на момент `now`. Истёкший токен означает выход.
    pub fn from_token_at(token: Option<&str>, now: DateTime<Utc>) -> Self {
        let Some(claims) = token.and_then(decode_claims) else {
            return Self::LoggedOut;
        };
        if claims.exp.is_some_and(|exp| exp <= now.timestamp()) {
            return Self::LoggedOut;
        }
        Self::LoggedIn {
            user_id: claims.id,
            role: claims.role,
            verified: claims.is_verified,
        }
    }

    /// Вошёл ли пользователь.
    pub fn is_logged_in(&self) -> bool {
        matches!(self, Self::LoggedIn { .. })
    }

    /// Идентификатор пользователя из токена.
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Self::LoggedIn { user_id, .. } => *user_id,
            Self::LoggedOut => None,
        }
    }

    /// Есть ли доступ к модерации.
    pub fn is_staff(&self) -> bool {
        matches!(self, Self::LoggedIn { role, .. } if role.is_staff())
    }

    /// Пройдена ли верификация.
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::LoggedIn { verified: true, .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Ссылка в навигации.
pub enum NavLink {
    /// Главная.
    Home,
    /// Каталог объявлений.
    Notices,
    /// Вход.
    Login,
    /// Регистрация.
    Register,
    /// Профиль.
    Profile,
    /// Мои объявления.
    MyNotices,
    /// Сообщения.
    Chats,
    /// Новое объявление.
    CreateNotice,
    /// Заявка на верификацию.
    Verify,
    /// Панель модерации.
    Admin,
    /// Выход.
    Logout,
}

impl NavLink {
    /// Подпись ссылки.
    pub fn label(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Notices => "Notices",
            Self::Login => "Login",
            Self::Register => "Register",
            Self::Profile => "Profile",
            Self::MyNotices => "My notices",
            Self::Chats => "Chats",
            Self::CreateNotice => "Create notice",
            Self::Verify => "Verify",
            Self::Admin => "Admin",
            Self::Logout => "Logout",
        }
    }

    /// Путь во фронтенде.
    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Notices => "/notices",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Profile => "/profile",
            Self::MyNotices => "/profile/notices",
            Self::Chats => "/chats",
            Self::CreateNotice => "/notices/new",
            Self::Verify => "/verify",
            Self::Admin => "/admin",
            Self::Logout => "/logout",
        }
    }
}

/// Ссылки навигации для состояния сессии.
pub fn nav_links(view: &SessionView) -> Vec<NavLink> {
    let mut links = vec![NavLink::Home, NavLink::Notices];
    match view {
        SessionView::LoggedOut => {
            links.extend([NavLink::Login, NavLink::Register]);
        }
        SessionView::LoggedIn { role, verified, .. } => {
            links.extend([NavLink::Profile, NavLink::MyNotices, NavLink::Chats]);
            links.push(if *verified {
                NavLink::CreateNotice
            } else {
                NavLink::Verify
            });
            if role.is_staff() {
                links.push(NavLink::Admin);
            }
            links.push(NavLink::Logout);
        }
    }
    links
}
