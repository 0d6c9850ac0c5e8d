use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;
use market_core::events::SessionEvent;
use market_core::forms::{LoginForm, RegisterForm};
use market_core::models::AuthResponse;
use validator::Validate;

use crate::api::{self, ApiError};
use crate::state::AppState;
use crate::view_model::validation_message;

/// После входа: событие с токеном, затем профиль (из ответа или отдельным запросом).
async fn start_session(state: AppState, auth: AuthResponse) -> Result<(), ApiError> {
    let token = auth.token.clone();
    state.publish(SessionEvent::LoggedIn {
        token: token.clone(),
    });

    let user = match auth.user {
        Some(user) => user,
        None => api::current_user(&token).await?,
    };
    state.publish(SessionEvent::ProfileChanged { user });
    Ok(())
}

#[component]
pub(crate) fn LoginPanel(state: AppState) -> impl IntoView {
    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());

    let on_login = move |ev: SubmitEvent| {
        ev.prevent_default();
        state.clear_error();

        let form = LoginForm {
            email: email.get().trim().to_string(),
            password: password.get(),
        };
        if let Err(errors) = form.validate() {
            state.set_error(validation_message(&errors));
            return;
        }

        state.loading.set(true);
        spawn_local(async move {
            let result = match api::login(&form).await {
                Ok(auth) => start_session(state, auth).await,
                Err(err) => Err(err),
            };
            if let Err(err) = result {
                state.set_error(err.to_string());
            }
            state.loading.set(false);
        });
    };

    view! {
        <h2>"Login"</h2>
        <form on:submit=on_login>
            <input
                placeholder="email"
                on:input=move |ev| email.set(event_target_value(&ev))
            />
            <input
                placeholder="password"
                type="password"
                on:input=move |ev| password.set(event_target_value(&ev))
            />
            <button type="submit" disabled=move || state.loading.get()>"Login"</button>
        </form>
    }
}

#[component]
pub(crate) fn RegisterPanel(state: AppState) -> impl IntoView {
    let name = RwSignal::new(String::new());
    let surname = RwSignal::new(String::new());
    let phone = RwSignal::new(String::new());
    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());

    let on_register = move |ev: SubmitEvent| {
        ev.prevent_default();
        state.clear_error();

        let form = RegisterForm {
            name: name.get().trim().to_string(),
            surname: surname.get().trim().to_string(),
            phone: phone.get().trim().to_string(),
            email: email.get().trim().to_string(),
            password: password.get(),
        };
        if let Err(errors) = form.validate() {
            state.set_error(validation_message(&errors));
            return;
        }

        state.loading.set(true);
        spawn_local(async move {
            let result = match api::register(&form).await {
                Ok(auth) => start_session(state, auth).await,
                Err(err) => Err(err),
            };
            if let Err(err) = result {
                state.set_error(err.to_string());
            }
            state.loading.set(false);
        });
    };

    view! {
        <h2>"Register"</h2>
        <form on:submit=on_register>
            <input placeholder="name" on:input=move |ev| name.set(event_target_value(&ev)) />
            <input placeholder="surname" on:input=move |ev| surname.set(event_target_value(&ev)) />
            <input placeholder="phone" on:input=move |ev| phone.set(event_target_value(&ev)) />
            <input placeholder="email" on:input=move |ev| email.set(event_target_value(&ev)) />
            <input
                placeholder="password (8+ символов)"
                type="password"
                on:input=move |ev| password.set(event_target_value(&ev))
            />
            <button type="submit" disabled=move || state.loading.get()>"Register"</button>
        </form>
    }
}
