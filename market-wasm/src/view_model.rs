//! Чистые функции для разметки: подписи и сообщения об ошибках.

use market_core::images::first_image_url;
use market_core::listing::PageItem;
use market_core::models::{ChatMessage, Dialogue, Post};
use serde::Deserialize;
use validator::ValidationErrors;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn fallback_message(status: u16) -> String {
    match status {
        400 => "Некорректный запрос".to_string(),
        401 => "Требуется авторизация".to_string(),
        403 => "Недостаточно прав для этой операции".to_string(),
        404 => "Ресурс не найден".to_string(),
        409 => "Конфликт данных (например, пользователь уже существует)".to_string(),
        500..=599 => "Ошибка сервера".to_string(),
        _ => format!("HTTP ошибка {status}"),
    }
}

/// Текст ошибки для баннера: сообщение из JSON-тела, сырой текст или
/// стандартная фраза по статусу.
pub(crate) fn error_message(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return fallback_message(status);
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed
            .message
            .or(parsed.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback_message(status)),
        Err(_) => body.to_string(),
    }
}

/// Список полей формы, не прошедших проверку.
pub(crate) fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .keys()
        .map(|field| field.to_string())
        .collect();
    fields.sort();
    format!("Проверьте поля: {}", fields.join(", "))
}

/// Подпись кнопки переключателя страниц.
pub(crate) fn page_label(item: PageItem) -> String {
    match item {
        PageItem::Page { number, .. } => number.to_string(),
        PageItem::Ellipsis => "…".to_string(),
    }
}

pub(crate) fn card_image(post: &Post) -> Option<String> {
    first_image_url(post.images.as_slice())
}

pub(crate) fn is_mine(message: &ChatMessage, me: i64) -> bool {
    message.sender_id == me
}

/// Заголовок диалога в списке: собеседник и объявление.
pub(crate) fn dialogue_title(dialogue: &Dialogue, me: i64) -> String {
    let other = dialogue
        .counterpart(me)
        .map_or_else(|| "Собеседник".to_string(), |user| user.name.clone());
    match dialogue.post_id() {
        Some(post_id) => format!("{other} · #{post_id}"),
        None => other,
    }
}
