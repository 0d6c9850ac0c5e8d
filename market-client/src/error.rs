use thiserror::Error;

#[derive(Debug, Error)]
/// Ошибки клиентской библиотеки `market-client`.
pub enum MarketClientError {
    /// Ошибка HTTP-транспорта (`reqwest`).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Требуется авторизация (отсутствует/некорректен токен).
    #[error("unauthorized")]
    Unauthorized,

    /// Запрошенный ресурс не найден.
    #[error("not found")]
    NotFound,

    /// Некорректный запрос или бизнес-ошибка backend.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Форма не прошла проверку на клиенте.
    #[error("validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Ответ backend не удалось разобрать.
    #[error("decode error: {0}")]
    Decode(String),

    /// Не удалось прочитать файл для загрузки.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Результат операций `market-client`.
pub type MarketClientResult<T> = Result<T, MarketClientError>;

impl MarketClientError {
    pub(crate) fn from_http_status(status: reqwest::StatusCode, message: Option<String>) -> Self {
        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Self::Unauthorized
            }
            reqwest::StatusCode::NOT_FOUND => Self::NotFound,
            _ => {
                let message = message.unwrap_or_else(|| format!("http status {status}"));
                Self::InvalidRequest(message)
            }
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_http_status(status, None);
        }
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        Self::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn http_status_mapping_covers_common_errors() {
        let unauth = MarketClientError::from_http_status(StatusCode::UNAUTHORIZED, None);
        assert!(matches!(unauth, MarketClientError::Unauthorized));

        let forbidden = MarketClientError::from_http_status(StatusCode::FORBIDDEN, None);
        assert!(matches!(forbidden, MarketClientError::Unauthorized));

        let not_found = MarketClientError::from_http_status(StatusCode::NOT_FOUND, None);
        assert!(matches!(not_found, MarketClientError::NotFound));

        let invalid = MarketClientError::from_http_status(
            StatusCode::BAD_REQUEST,
            Some("title is required".to_string()),
        );
        match invalid {
            MarketClientError::InvalidRequest(msg) => assert_eq!(msg, "title is required"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn http_status_mapping_falls_back_to_status_text() {
        let err = MarketClientError::from_http_status(StatusCode::INTERNAL_SERVER_ERROR, None);
        match err {
            MarketClientError::InvalidRequest(msg) => assert!(msg.contains("500")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
