//! Общая логика клиента доски объявлений, не зависящая от транспорта.
//!
//! Используется и нативным клиентом (`market-client`, `market-cli`), и
//! браузерным фронтендом (`market-wasm`):
//! - модели данных, которые отдаёт backend;
//! - сортировка вкладок и пагинация списков объявлений;
//! - разбор JWT-сессии и набор ссылок навигации по роли;
//! - состояние чата с оптимистичным добавлением сообщений;
//! - нормализация картинок в data-URL;
//! - валидация форм перед отправкой.
#![warn(missing_docs)]

pub mod chat;
pub mod events;
pub mod forms;
pub mod images;
pub mod listing;
pub mod models;
pub mod session;

pub use chat::{ChatThread, ThreadKey};
pub use events::{SessionEvent, SessionEvents, SubscriptionId};
pub use listing::{PageItem, Paginator, SortTab};
pub use session::{NavLink, SessionClaims, SessionView};
