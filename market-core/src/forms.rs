//! Формы, которые проверяются на клиенте перед отправкой на backend.

use std::borrow::Cow;

use serde::Serialize;
use validator::{Validate, ValidationError};

use crate::models::VerificationStatus;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("blank", "must not be blank"));
    }
    Ok(())
}

fn non_negative_price(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        return Ok(());
    }
    Err(error("price", "price must be a finite number >= 0"))
}

fn currency_code(value: &str) -> Result<(), ValidationError> {
    if value.len() == 3 && value.chars().all(|c| c.is_ascii_alphabetic()) {
        return Ok(());
    }
    Err(error("currency", "currency must be a 3-letter code"))
}

#[derive(Debug, Clone, Serialize, Validate)]
/// Вход по email и паролю.
pub struct LoginForm {
    /// Email.
    #[validate(email)]
    pub email: String,
    /// Пароль.
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Validate)]
/// Регистрация.
pub struct RegisterForm {
    /// Имя.
    #[validate(length(min = 1, max = 64), custom(function = "not_blank"))]
    pub name: String,
    /// Фамилия.
    #[validate(length(min = 1, max = 64), custom(function = "not_blank"))]
    pub surname: String,
    /// Телефон.
    #[validate(length(min = 5, max = 20))]
    pub phone: String,
    /// Email.
    #[validate(email)]
    pub email: String,
    /// Пароль.
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Validate)]
/// Запрос на сброс пароля.
pub struct PasswordResetForm {
    /// Email аккаунта.
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
/// Изменение профиля. Пустые поля не отправляются.
pub struct ProfileForm {
    /// Имя.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 64))]
    pub name: Option<String>,
    /// Фамилия.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 64))]
    pub surname: Option<String>,
    /// Телефон.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 5, max = 20))]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
/// Создание или редактирование объявления (без картинок).
pub struct NoticeForm {
    /// Заголовок.
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub title: String,
    /// Описание.
    #[validate(custom(function = "not_blank"))]
    pub caption: String,
    /// Цена.
    #[validate(custom(function = "non_negative_price"))]
    pub price: f64,
    /// Валюта.
    #[validate(custom(function = "currency_code"))]
    pub currency: String,
    /// Категория.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    /// Теги.
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
/// Отзыв о пользователе.
pub struct ReviewForm {
    /// О ком отзыв.
    pub user_id: i64,
    /// Оценка.
    #[validate(range(min = 1, max = 5))]
    pub rating: u8,
    /// Текст.
    #[validate(length(max = 2000), custom(function = "not_blank"))]
    pub text: String,
}

fn complaint_target(form: &ComplaintForm) -> Result<(), ValidationError> {
    if form.post_id.is_none() && form.user_id.is_none() {
        return Err(error(
            "missing_target",
            "complaint must reference a post or a user",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "complaint_target"))]
/// Жалоба на объявление или пользователя.
pub struct ComplaintForm {
    /// Текст.
    #[validate(length(max = 2000), custom(function = "not_blank"))]
    pub message: String,
    /// Объявление.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<i64>,
    /// Пользователь.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Validate)]
/// Причина блокировки пользователя.
pub struct BlockForm {
    /// Причина.
    #[validate(length(max = 500), custom(function = "not_blank"))]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
/// Решение по заявке на верификацию.
pub struct VerificationDecision {
    /// Новый статус.
    pub status: VerificationStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice() -> NoticeForm {
        NoticeForm {
            title: "Bike".to_string(),
            caption: "Almost new".to_string(),
            price: 150.0,
            currency: "EUR".to_string(),
            category_id: Some(1),
            tags: vec!["sport".to_string()],
        }
    }

    #[test]
    fn valid_notice_passes() {
        assert!(notice().validate().is_ok());
    }

    #[test]
    fn notice_rejects_blank_title_negative_price_and_bad_currency() {
        let mut form = notice();
        form.title = "   ".to_string();
        form.price = -1.0;
        form.currency = "euro".to_string();

        let errors = form.validate().expect_err("form must be invalid");
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("price"));
        assert!(fields.contains_key("currency"));
    }

    #[test]
    fn notice_price_must_be_finite() {
        for price in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -0.01] {
            let form = NoticeForm {
                price,
                ..notice()
            };
            let errors = form.validate().expect_err("price must be rejected");
            assert!(errors.field_errors().contains_key("price"));
        }

        let free = NoticeForm {
            price: 0.0,
            ..notice()
        };
        assert!(free.validate().is_ok());
    }

    #[test]
    fn review_rating_must_be_in_range() {
        let mut form = ReviewForm {
            user_id: 1,
            rating: 5,
            text: "great seller".to_string(),
        };
        assert!(form.validate().is_ok());

        form.rating = 0;
        assert!(form.validate().is_err());
        form.rating = 6;
        assert!(form.validate().is_err());
    }

    #[test]
    fn complaint_needs_target() {
        let form = ComplaintForm {
            message: "scam".to_string(),
            post_id: None,
            user_id: None,
        };
        assert!(form.validate().is_err());

        let form = ComplaintForm {
            post_id: Some(3),
            ..form
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn register_checks_email_and_password_length() {
        let form = RegisterForm {
            name: "Ann".to_string(),
            surname: "Lee".to_string(),
            phone: "+123456".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
        };
        let errors = form.validate().expect_err("form must be invalid");
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(!fields.contains_key("name"));
    }

    #[test]
    fn profile_form_skips_missing_fields() {
        let form = ProfileForm {
            phone: Some("+12345".to_string()),
            ..Default::default()
        };
        assert!(form.validate().is_ok());
        let json = serde_json::to_value(&form).expect("form must serialize");
        assert_eq!(json, serde_json::json!({"phone": "+12345"}));
    }

    #[test]
    fn notice_form_serializes_camel_case() {
        let json = serde_json::to_value(notice()).expect("form must serialize");
        assert_eq!(json["categoryId"], 1);
        assert_eq!(json["currency"], "EUR");
    }
}
