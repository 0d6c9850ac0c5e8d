use leptos::prelude::*;
use market_core::listing::{MAIN_PAGE_SIZE, NOTICES_PAGE_SIZE};
use market_core::session::NavLink;

use crate::components::auth_panel::{LoginPanel, RegisterPanel};
use crate::components::chat_panel::ChatPanel;
use crate::components::nav_bar::NavBar;
use crate::components::notices_panel::{NoticesPanel, load_posts};
use crate::components::profile_panel::ProfilePanel;
use crate::state::AppState;

/// Разделы с загрузкой файлов и модерацией есть только в market-cli.
fn cli_hint(link: NavLink) -> &'static str {
    match link {
        NavLink::CreateNotice => "market-cli create --title ... --caption ... --price ...",
        NavLink::Verify => "market-cli verify --photo ...",
        NavLink::Admin => "market-cli admin --help",
        _ => "market-cli --help",
    }
}

#[component]
pub fn App() -> impl IntoView {
    let state = AppState::new();

    load_posts(state);

    let user_text = move || {
        state
            .user
            .get()
            .map(|u| format!("{} ({})", u.display_name(), u.email))
            .unwrap_or_else(|| "гость".to_string())
    };

    let page = move || match state.page.get() {
        NavLink::Home => {
            view! { <NoticesPanel state=state page_size=MAIN_PAGE_SIZE /> }.into_any()
        }
        NavLink::Notices => {
            view! { <NoticesPanel state=state page_size=NOTICES_PAGE_SIZE /> }.into_any()
        }
        NavLink::MyNotices => {
            view! { <NoticesPanel state=state page_size=NOTICES_PAGE_SIZE mine=true /> }.into_any()
        }
        NavLink::Login => view! { <LoginPanel state=state /> }.into_any(),
        NavLink::Register => view! { <RegisterPanel state=state /> }.into_any(),
        NavLink::Profile => view! { <ProfilePanel state=state /> }.into_any(),
        NavLink::Chats => view! { <ChatPanel state=state /> }.into_any(),
        link => view! {
            <section>
                <h2>{link.label()}</h2>
                <p>"Этот раздел доступен через CLI: " <code>{cli_hint(link)}</code></p>
            </section>
        }
        .into_any(),
    };

    view! {
        <main class="page">
            <section class="container">
                <h1>"Market (Leptos)"</h1>
                <NavBar state=state />
                <p>"Пользователь: " {user_text}</p>

                <Show when=move || state.error.get().is_some()>
                    <div class="error-banner">
                        <strong>"Ошибка: "</strong>
                        {move || state.error.get().unwrap_or_default()}
                    </div>
                </Show>

                {page}
            </section>
        </main>
    }
}
