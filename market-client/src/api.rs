use async_trait::async_trait;
use market_core::models::{ChatMessage, Dialogue, OutgoingMessage};

use crate::error::MarketClientResult;

#[async_trait]
/// Операции чата, от которых зависит [`crate::ChatController`].
///
/// Реализуется [`crate::HttpClient`]; в тестах подменяется фейком.
pub trait ChatApi: Send + Sync {
    /// Список диалогов текущего пользователя.
    async fn list_dialogues(&self, token: &str) -> MarketClientResult<Vec<Dialogue>>;

    /// Лента сообщений с собеседником по объявлению.
    async fn chat_messages(
        &self,
        token: &str,
        other_user_id: i64,
        post_id: i64,
    ) -> MarketClientResult<Vec<ChatMessage>>;

    /// Отправляет сообщение. Сервер может вернуть созданную запись, а может и нет.
    async fn send_message(
        &self,
        token: &str,
        message: &OutgoingMessage,
    ) -> MarketClientResult<Option<ChatMessage>>;
}
