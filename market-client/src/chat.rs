use market_core::chat::{ChatThread, ThreadKey};
use market_core::models::{ChatMessage, Dialogue};

use crate::api::ChatApi;
use crate::error::{MarketClientError, MarketClientResult};

#[derive(Debug)]
/// Открытый чат текущего пользователя.
///
/// Загружает ленту выбранного диалога и после успешной отправки добавляет
/// сообщение локально, без повторной загрузки ленты.
pub struct ChatController<A: ChatApi> {
    api: A,
    token: String,
    me: i64,
    thread: ChatThread,
}

impl<A: ChatApi> ChatController<A> {
    /// Создаёт контроллер для пользователя `me` с токеном `token`.
    pub fn new(api: A, token: impl Into<String>, me: i64) -> Self {
        Self {
            api,
            token: token.into(),
            me,
            thread: ChatThread::new(),
        }
    }

    /// Текущее состояние диалога.
    pub fn thread(&self) -> &ChatThread {
        &self.thread
    }

    /// Идентификатор текущего пользователя.
    pub fn me(&self) -> i64 {
        self.me
    }

    /// Список диалогов.
    pub async fn dialogues(&self) -> MarketClientResult<Vec<Dialogue>> {
        self.api.list_dialogues(&self.token).await
    }

    /// Выбирает диалог и загружает его ленту.
    pub async fn open(
        &mut self,
        other_user_id: i64,
        post_id: i64,
    ) -> MarketClientResult<&[ChatMessage]> {
        let key = ThreadKey::new(other_user_id, post_id);
        self.thread.select(key);
        self.load(key).await?;
        Ok(self.thread.messages())
    }

    /// Перезагружает ленту выбранного диалога.
    pub async fn refresh(&mut self) -> MarketClientResult<&[ChatMessage]> {
        let key = self.selected_key()?;
        self.load(key).await?;
        Ok(self.thread.messages())
    }

    /// Отправляет сообщение в выбранный диалог.
    ///
    /// Пустой текст отклоняется до запроса. При ошибке отправки лента не меняется.
    pub async fn send(&mut self, text: &str) -> MarketClientResult<&ChatMessage> {
        let key = self.selected_key()?;
        let text = text.trim();
        if text.is_empty() {
            return Err(MarketClientError::InvalidRequest(
                "message must not be empty".to_string(),
            ));
        }

        let echo = self
            .api
            .send_message(&self.token, &key.outgoing(text))
            .await?;
        tracing::debug!(
            other_user_id = key.other_user_id,
            post_id = key.post_id,
            server_id = ?echo.as_ref().and_then(|m| m.id),
            "message sent"
        );

        self.thread
            .append_sent(self.me, text, echo)
            .ok_or_else(|| MarketClientError::InvalidRequest("no chat selected".to_string()))
    }

    fn selected_key(&self) -> MarketClientResult<ThreadKey> {
        self.thread
            .selected()
            .ok_or_else(|| MarketClientError::InvalidRequest("no chat selected".to_string()))
    }

    async fn load(&mut self, key: ThreadKey) -> MarketClientResult<()> {
        let messages = self
            .api
            .chat_messages(&self.token, key.other_user_id, key.post_id)
            .await?;
        self.thread.replace_messages(key, messages);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use market_core::models::OutgoingMessage;

    use super::*;

    #[derive(Clone, Default)]
    struct FakeChatApi {
        thread: Arc<Mutex<Vec<ChatMessage>>>,
        send_result: Arc<Mutex<Option<ChatMessage>>>,
        fail_send: Arc<Mutex<bool>>,
        sent: Arc<Mutex<Vec<OutgoingMessage>>>,
        fetches: Arc<Mutex<u32>>,
    }

    #[async_trait]
    impl ChatApi for FakeChatApi {
        async fn list_dialogues(&self, _token: &str) -> MarketClientResult<Vec<Dialogue>> {
            Ok(vec![Dialogue {
                id: 1,
                ..Default::default()
            }])
        }

        async fn chat_messages(
            &self,
            _token: &str,
            _other_user_id: i64,
            _post_id: i64,
        ) -> MarketClientResult<Vec<ChatMessage>> {
            *self.fetches.lock().expect("fetches mutex poisoned") += 1;
            Ok(self.thread.lock().expect("thread mutex poisoned").clone())
        }

        async fn send_message(
            &self,
            _token: &str,
            message: &OutgoingMessage,
        ) -> MarketClientResult<Option<ChatMessage>> {
            if *self.fail_send.lock().expect("fail_send mutex poisoned") {
                return Err(MarketClientError::InvalidRequest("blocked".to_string()));
            }
            self.sent
                .lock()
                .expect("sent mutex poisoned")
                .push(message.clone());
            Ok(self
                .send_result
                .lock()
                .expect("send_result mutex poisoned")
                .clone())
        }
    }

    fn incoming(id: i64, text: &str) -> ChatMessage {
        ChatMessage {
            id: Some(id),
            sender_id: 2,
            receiver_id: 1,
            post_id: 10,
            message: text.to_string(),
            created_at: None,
        }
    }

    #[tokio::test]
    async fn send_appends_once_without_refetch() {
        let api = FakeChatApi::default();
        *api.thread.lock().expect("thread mutex poisoned") = vec![incoming(1, "hello")];
        let mut chat = ChatController::new(api.clone(), "jwt", 1);

        let loaded = chat.open(2, 10).await.expect("open must succeed").len();
        assert_eq!(loaded, 1);

        let sent = chat
            .send("  is it available?  ")
            .await
            .expect("send must succeed")
            .clone();

        assert_eq!(chat.thread().len(), 2);
        assert_eq!(sent.message, "is it available?");
        assert_eq!(sent.sender_id, 1);
        assert!(sent.id.is_some_and(|id| id < 0));
        assert_eq!(*api.fetches.lock().expect("fetches mutex poisoned"), 1);

        let outgoing = api.sent.lock().expect("sent mutex poisoned").clone();
        assert_eq!(
            outgoing,
            vec![OutgoingMessage {
                receiver_id: 2,
                post_id: 10,
                message: "is it available?".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn send_uses_server_id_when_present() {
        let api = FakeChatApi::default();
        *api.send_result.lock().expect("send_result mutex poisoned") = Some(incoming(55, "echo"));
        let mut chat = ChatController::new(api, "jwt", 1);
        chat.open(2, 10).await.expect("open must succeed");

        let sent = chat.send("hi").await.expect("send must succeed");
        assert_eq!(sent.id, Some(55));
        assert_eq!(sent.message, "hi");
    }

    #[tokio::test]
    async fn failed_send_leaves_thread_untouched() {
        let api = FakeChatApi::default();
        *api.thread.lock().expect("thread mutex poisoned") = vec![incoming(1, "hello")];
        *api.fail_send.lock().expect("fail_send mutex poisoned") = true;
        let mut chat = ChatController::new(api, "jwt", 1);
        chat.open(2, 10).await.expect("open must succeed");

        let err = chat.send("hi").await.expect_err("send must fail");
        assert!(matches!(err, MarketClientError::InvalidRequest(_)));
        assert_eq!(chat.thread().len(), 1);
    }

    #[tokio::test]
    async fn blank_text_and_missing_selection_are_rejected() {
        let api = FakeChatApi::default();
        let mut chat = ChatController::new(api.clone(), "jwt", 1);

        let err = chat.send("hi").await.expect_err("no chat selected");
        assert!(matches!(err, MarketClientError::InvalidRequest(_)));

        chat.open(2, 10).await.expect("open must succeed");
        let err = chat.send("   ").await.expect_err("blank text");
        assert!(matches!(err, MarketClientError::InvalidRequest(_)));
        assert!(api.sent.lock().expect("sent mutex poisoned").is_empty());
    }

    #[tokio::test]
    async fn refresh_refetches_selected_thread() {
        let api = FakeChatApi::default();
        let mut chat = ChatController::new(api.clone(), "jwt", 1);
        assert!(chat.refresh().await.is_err());

        chat.open(2, 10).await.expect("open must succeed");
        *api.thread.lock().expect("thread mutex poisoned") = vec![incoming(1, "new")];
        let messages = chat.refresh().await.expect("refresh must succeed");
        assert_eq!(messages.len(), 1);
        assert_eq!(*api.fetches.lock().expect("fetches mutex poisoned"), 2);
        assert_eq!(chat.dialogues().await.expect("dialogues").len(), 1);
    }
}
