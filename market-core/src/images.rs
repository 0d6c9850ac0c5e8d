//! Картинки объявлений и заявок приходят как base64-строки, иногда уже с
//! data-URI префиксом, иногда без него.

/// Префикс для строк, у которых нет собственного data-URI.
pub const DEFAULT_IMAGE_PREFIX: &str = "data:image/jpeg;base64,";

/// Разбирает JSON-массив строк. На любой ошибке возвращает пустой список.
pub fn parse_image_list(raw: &str) -> Vec<String> {
    serde_json::from_str::<Vec<String>>(raw.trim()).unwrap_or_default()
}

/// Дополняет base64-строку префиксом, если его ещё нет.
pub fn to_data_url(entry: &str) -> String {
    let entry = entry.trim();
    if entry.starts_with("data:") {
        return entry.to_string();
    }
    format!("{DEFAULT_IMAGE_PREFIX}{entry}")
}

/// Полные data-URL для JSON-массива base64-строк.
pub fn image_urls(raw: &str) -> Vec<String> {
    parse_image_list(raw)
        .iter()
        .map(|entry| to_data_url(entry))
        .collect()
}

/// URL превью для карточки в списке.
pub fn first_image_url(images: &[String]) -> Option<String> {
    images.first().map(|entry| to_data_url(entry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_urls_prefixes_bare_entries_and_keeps_data_uris() {
        let urls = image_urls(r#"["QUJD", "data:image/png;base64,REVG"]"#);
        assert_eq!(
            urls,
            vec![
                "data:image/jpeg;base64,QUJD".to_string(),
                "data:image/png;base64,REVG".to_string(),
            ]
        );
    }

    #[test]
    fn image_urls_returns_empty_for_unparsable_input() {
        assert!(image_urls("").is_empty());
        assert!(image_urls("{not-json}").is_empty());
        assert!(image_urls(r#"[1, 2, 3]"#).is_empty());
        assert!(image_urls(r#""QUJD""#).is_empty());
    }

    #[test]
    fn first_image_url_uses_first_entry() {
        let images = vec!["QUJD".to_string(), "REVG".to_string()];
        assert_eq!(
            first_image_url(&images).as_deref(),
            Some("data:image/jpeg;base64,QUJD")
        );
        assert!(first_image_url(&[]).is_none());
    }
}
