use leptos::prelude::*;
use market_core::events::SessionEvent;
use market_core::session::{NavLink, nav_links};

use crate::state::AppState;

/// Навигация, зависящая от роли и верификации из токена.
#[component]
pub(crate) fn NavBar(state: AppState) -> impl IntoView {
    let links = move || nav_links(&state.session());

    view! {
        <nav class="nav">
            <For
                each=links
                key=|link| *link
                children=move |link: NavLink| {
                    let on_click = move |_| {
                        state.clear_error();
                        if link == NavLink::Logout {
                            state.publish(SessionEvent::LoggedOut);
                        } else {
                            state.page.set(link);
                        }
                    };
                    view! {
                        <a
                            href=link.path()
                            class:active=move || state.page.get() == link
                            on:click=move |ev| {
                                ev.prevent_default();
                                on_click(ev);
                            }
                        >
                            {link.label()}
                        </a>
                    }
                }
            />
        </nav>
    }
}
