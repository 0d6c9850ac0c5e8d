//! Уведомления о входе, выходе и смене профиля для независимых частей
//! интерфейса.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::models::User;

#[derive(Debug, Clone, PartialEq)]
/// Событие сессии.
pub enum SessionEvent {
    /// Пользователь вошёл или зарегистрировался.
    LoggedIn {
        /// Новый токен.
        token: String,
    },
    /// Пользователь вышел.
    LoggedOut,
    /// Профиль текущего пользователя изменился.
    ProfileChanged {
        /// Обновлённый профиль.
        user: User,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Идентификатор подписки для отписки.
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

#[derive(Clone, Default)]
/// Общий издатель событий сессии. Клоны разделяют одних и тех же подписчиков.
pub struct SessionEvents {
    listeners: Arc<Mutex<Vec<(SubscriptionId, Listener)>>>,
    next_id: Arc<AtomicU64>,
}

impl fmt::Debug for SessionEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionEvents")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl SessionEvents {
    /// Пустой издатель.
    pub fn new() -> Self {
        Self::default()
    }

    /// Подписывает обработчик на все события.
    pub fn subscribe(
        &self,
        listener: impl Fn(&SessionEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Удаляет подписку. Возвращает `false`, если её уже нет.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Количество подписчиков.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Рассылает событие всем подписчикам в порядке подписки.
    pub fn publish(&self, event: &SessionEvent) {
        // Обработчики вызываются вне блокировки: им можно подписываться и отписываться.
        let snapshot: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            listener(event);
        }
    }
}
