//! Состояние открытого диалога.

use chrono::Utc;

use crate::models::{ChatMessage, OutgoingMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Диалог определяется собеседником и объявлением.
pub struct ThreadKey {
    /// Собеседник.
    pub other_user_id: i64,
    /// Объявление.
    pub post_id: i64,
}

impl ThreadKey {
    /// Новый ключ диалога.
    pub fn new(other_user_id: i64, post_id: i64) -> Self {
        Self {
            other_user_id,
            post_id,
        }
    }

    /// Тело запроса на отправку текста в этот диалог.
    pub fn outgoing(&self, text: &str) -> OutgoingMessage {
        OutgoingMessage {
            receiver_id: self.other_user_id,
            post_id: self.post_id,
            message: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Выбранный диалог и его сообщения в памяти.
///
/// После успешной отправки сообщение добавляется локально, без повторной
/// загрузки. Если сервер не вернул id, выдаётся локальный отрицательный id.
pub struct ChatThread {
    selected: Option<ThreadKey>,
    messages: Vec<ChatMessage>,
    next_local_id: i64,
}

impl Default for ChatThread {
    fn default() -> Self {
        Self {
            selected: None,
            messages: Vec::new(),
            next_local_id: -1,
        }
    }
}

impl ChatThread {
    /// Пустое состояние без выбранного диалога.
    pub fn new() -> Self {
        Self::default()
    }

    /// Выбранный диалог.
    pub fn selected(&self) -> Option<ThreadKey> {
        self.selected
    }

    /// Сообщения выбранного диалога.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Количество сообщений.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Нет ли сообщений.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Выбирает диалог. При смене диалога сообщения очищаются.
    ///
    /// Возвращает `true`, если выбор изменился.
    pub fn select(&mut self, key: ThreadKey) -> bool {
        if self.selected == Some(key) {
            return false;
        }
        self.selected = Some(key);
        self.messages.clear();
        true
    }

    /// Сбрасывает выбор.
    pub fn close(&mut self) {
        self.selected = None;
        self.messages.clear();
    }

    /// Устанавливает загруженную ленту. Ответ для другого диалога отбрасывается.
    pub fn replace_messages(&mut self, key: ThreadKey, messages: Vec<ChatMessage>) -> bool {
        if self.selected != Some(key) {
            return false;
        }
        self.messages = messages;
        true
    }

    /// Добавляет только что отправленное сообщение.
    ///
    /// `echo` это то, что вернул сервер на отправку (если вернул). Из него берутся
    /// id и время; текст всегда тот, что отправил пользователь.
    /// Без выбранного диалога ничего не делает.
    pub fn append_sent(
        &mut self,
        sender_id: i64,
        text: &str,
        echo: Option<ChatMessage>,
    ) -> Option<&ChatMessage> {
        let key = self.selected?;
        let (server_id, created_at) = echo
            .map(|echo| (echo.id, echo.created_at))
            .unwrap_or((None, None));

        let id = match server_id {
            Some(id) => id,
            None => self.next_fallback_id(),
        };

        self.messages.push(ChatMessage {
            id: Some(id),
            sender_id,
            receiver_id: key.other_user_id,
            post_id: key.post_id,
            message: text.to_string(),
            created_at: created_at.or_else(|| Some(Utc::now())),
        });
        self.messages.last()
    }

    fn next_fallback_id(&mut self) -> i64 {
        let id = self.next_local_id;
        self.next_local_id -= 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: i64, text: &str) -> ChatMessage {
        ChatMessage {
            id: Some(id),
            sender_id: 2,
            receiver_id: 1,
            post_id: 10,
            message: text.to_string(),
            created_at: None,
        }
    }

    #[test]
    fn append_adds_exactly_one_message_with_fallback_id() {
        let key = ThreadKey::new(2, 10);
        let mut thread = ChatThread::new();
        thread.select(key);
        thread.replace_messages(key, vec![message(1, "hi"), message(2, "price?")]);

        let appended = thread
            .append_sent(1, "still available", None)
            .expect("thread is selected")
            .clone();

        assert_eq!(thread.len(), 3);
        assert_eq!(appended.message, "still available");
        assert_eq!(appended.id, Some(-1));
        assert_eq!(appended.receiver_id, 2);
        assert_eq!(appended.post_id, 10);
        assert!(appended.created_at.is_some());

        let second = thread
            .append_sent(1, "ok", Some(ChatMessage::default()))
            .expect("thread is selected")
            .clone();
        assert_eq!(second.id, Some(-2));
        assert_eq!(thread.len(), 4);
    }

    #[test]
    fn append_prefers_server_id() {
        let key = ThreadKey::new(2, 10);
        let mut thread = ChatThread::new();
        thread.select(key);

        let echo = ChatMessage {
            id: Some(77),
            message: "server text".to_string(),
            ..Default::default()
        };
        let appended = thread
            .append_sent(1, "sent text", Some(echo))
            .expect("thread is selected");

        assert_eq!(appended.id, Some(77));
        assert_eq!(appended.message, "sent text");
    }

    #[test]
    fn append_without_selection_is_noop() {
        let mut thread = ChatThread::new();
        assert!(thread.append_sent(1, "lost", None).is_none());
        assert!(thread.is_empty());
    }

    #[test]
    fn select_clears_only_on_change() {
        let first = ThreadKey::new(2, 10);
        let mut thread = ChatThread::new();
        assert!(thread.select(first));
        thread.replace_messages(first, vec![message(1, "hi")]);

        assert!(!thread.select(first));
        assert_eq!(thread.len(), 1);

        assert!(thread.select(ThreadKey::new(3, 10)));
        assert!(thread.is_empty());
    }

    #[test]
    fn stale_thread_response_is_ignored() {
        let mut thread = ChatThread::new();
        thread.select(ThreadKey::new(3, 11));

        let applied = thread.replace_messages(ThreadKey::new(2, 10), vec![message(1, "old")]);
        assert!(!applied);
        assert!(thread.is_empty());
    }

    #[test]
    fn outgoing_targets_thread() {
        let out = ThreadKey::new(5, 9).outgoing("hello");
        assert_eq!(out.receiver_id, 5);
        assert_eq!(out.post_id, 9);
        assert_eq!(out.message, "hello");
    }
}
