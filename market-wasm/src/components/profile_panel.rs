use leptos::prelude::*;
use leptos::task::spawn_local;
use market_core::events::SessionEvent;

use crate::api;
use crate::state::AppState;

#[component]
pub(crate) fn ProfilePanel(state: AppState) -> impl IntoView {
    if let Some(token) = state.token.get_untracked() {
        spawn_local(async move {
            match api::current_user(&token).await {
                Ok(user) => state.publish(SessionEvent::ProfileChanged { user }),
                Err(err) => state.set_error(err.to_string()),
            }
        });
    }

    view! {
        <section class="profile">
            <h2>"Profile"</h2>
            {move || {
                state
                    .user
                    .get()
                    .map(|user| {
                        view! {
                            <p><strong>{user.display_name()}</strong></p>
                            <p>{user.email.clone()}</p>
                            <p>{user.phone.clone().unwrap_or_default()}</p>
                            <p>{format!("role: {}", user.role.as_str())}</p>
                            <p>{if user.is_verified { "verified" } else { "not verified" }}</p>
                        }
                    })
            }}
        </section>
    }
}
