use leptos::prelude::*;
use market_core::chat::ChatThread;
use market_core::events::{SessionEvent, SessionEvents};
use market_core::models::{Post, User};
use market_core::session::{NavLink, SessionView};

use crate::storage;

#[derive(Debug, Clone, Copy)]
pub(crate) struct AppState {
    pub(crate) token: RwSignal<Option<String>>,
    pub(crate) user: RwSignal<Option<User>>,
    pub(crate) posts: RwSignal<Vec<Post>>,
    pub(crate) thread: RwSignal<ChatThread>,
    pub(crate) page: RwSignal<NavLink>,
    pub(crate) error: RwSignal<Option<String>>,
    pub(crate) loading: RwSignal<bool>,
    events: StoredValue<SessionEvents>,
}

impl AppState {
    /// Состояние, восстановленное из localStorage, с подпиской на события сессии.
    pub(crate) fn new() -> Self {
        let (saved_token, saved_user) = storage::restore_session();
        let token = RwSignal::new(saved_token);
        let user = RwSignal::new(saved_user);
        let thread = RwSignal::new(ChatThread::new());
        let page = RwSignal::new(NavLink::Home);
        let error = RwSignal::new(None);

        let events = SessionEvents::new();
        events.subscribe(move |event| {
            let result = match event {
                SessionEvent::LoggedIn { token: value } => {
                    token.set(Some(value.clone()));
                    page.set(NavLink::Home);
                    storage::save_token(value)
                }
                SessionEvent::LoggedOut => {
                    token.set(None);
                    user.set(None);
                    thread.update(ChatThread::close);
                    page.set(NavLink::Home);
                    storage::clear_session()
                }
                SessionEvent::ProfileChanged { user: profile } => {
                    user.set(Some(profile.clone()));
                    storage::save_user(profile)
                }
            };
            if let Err(err) = result {
                error.set(Some(err));
            }
        });

        Self {
            token,
            user,
            posts: RwSignal::new(Vec::new()),
            thread,
            page,
            error,
            loading: RwSignal::new(false),
            events: StoredValue::new(events),
        }
    }

    /// Рассылает событие сессии всем подписчикам.
    pub(crate) fn publish(&self, event: SessionEvent) {
        self.events.with_value(|events| events.publish(&event));
    }

    /// Id текущего пользователя: из токена, иначе из сохранённого профиля.
    pub(crate) fn me(&self) -> Option<i64> {
        self.session()
            .user_id()
            .or_else(|| self.user.with(|user| user.as_ref().map(|u| u.id)))
    }

    pub(crate) fn session(&self) -> SessionView {
        SessionView::from_token(self.token.get().as_deref())
    }

    pub(crate) fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        web_sys::console::warn_1(&message.as_str().into());
        self.error.set(Some(message));
    }

    pub(crate) fn clear_error(&self) {
        self.error.set(None);
    }
}
