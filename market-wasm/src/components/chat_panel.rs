use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;
use market_core::chat::ThreadKey;
use market_core::models::{ChatMessage, Dialogue};

use crate::api;
use crate::state::AppState;
use crate::view_model::{dialogue_title, is_mine};

fn load_dialogues(state: AppState, token: String, dialogues: RwSignal<Vec<Dialogue>>) {
    spawn_local(async move {
        match api::list_dialogues(&token).await {
            Ok(list) => dialogues.set(list),
            Err(err) => state.set_error(err.to_string()),
        }
    });
}

/// Загружает ленту. Если за время запроса выбран другой диалог, ответ отбрасывается.
fn load_thread(state: AppState, token: String, key: ThreadKey) {
    state.loading.set(true);
    spawn_local(async move {
        match api::chat_messages(&token, key.other_user_id, key.post_id).await {
            Ok(messages) => state.thread.update(|thread| {
                thread.replace_messages(key, messages);
            }),
            Err(err) => state.set_error(err.to_string()),
        }
        state.loading.set(false);
    });
}

#[component]
pub(crate) fn ChatPanel(state: AppState) -> impl IntoView {
    let dialogues = RwSignal::new(Vec::<Dialogue>::new());
    let draft = RwSignal::new(String::new());
    let me = move || state.me().unwrap_or_default();

    if let Some(token) = state.token.get_untracked() {
        load_dialogues(state, token.clone(), dialogues);
        if let Some(key) = state.thread.with_untracked(|thread| thread.selected()) {
            load_thread(state, token, key);
        }
    } else {
        state.set_error("Нужна авторизация для чатов");
    }

    let open = move |key: ThreadKey| {
        let Some(token) = state.token.get_untracked() else {
            return;
        };
        state.clear_error();
        state.thread.update(|thread| {
            thread.select(key);
        });
        load_thread(state, token, key);
    };

    let on_send = move |ev: SubmitEvent| {
        ev.prevent_default();
        state.clear_error();

        let text = draft.get().trim().to_string();
        if text.is_empty() {
            return;
        }
        let Some(key) = state.thread.with_untracked(|thread| thread.selected()) else {
            state.set_error("Выберите диалог");
            return;
        };
        let Some(token) = state.token.get_untracked() else {
            state.set_error("Нужна авторизация для отправки");
            return;
        };

        state.loading.set(true);
        spawn_local(async move {
            match api::send_message(&token, &key.outgoing(&text)).await {
                Ok(echo) => {
                    let sender = me();
                    state.thread.update(|thread| {
                        if thread.selected() == Some(key) {
                            thread.append_sent(sender, &text, echo);
                        }
                    });
                    draft.set(String::new());
                }
                Err(err) => state.set_error(err.to_string()),
            }
            state.loading.set(false);
        });
    };

    view! {
        <section class="chat">
            <aside class="dialogues">
                <h2>"Chats"</h2>
                <ul>
                    <For
                        each=move || dialogues.get()
                        key=|dialogue| dialogue.id
                        children=move |dialogue: Dialogue| {
                            let title = dialogue_title(&dialogue, me());
                            let key = dialogue
                                .counterpart(me())
                                .zip(dialogue.post_id())
                                .map(|(other, post_id)| ThreadKey::new(other.id, post_id));
                            let last = dialogue.last_message.clone().unwrap_or_default();
                            view! {
                                <li
                                    class:active=move || {
                                        key.is_some()
                                            && state.thread.with(|thread| thread.selected()) == key
                                    }
                                    on:click=move |_| {
                                        if let Some(key) = key {
                                            open(key);
                                        }
                                    }
                                >
                                    <strong>{title}</strong>
                                    <small>{last}</small>
                                </li>
                            }
                        }
                    />
                </ul>
            </aside>

            <Show
                when=move || state.thread.with(|thread| thread.selected().is_some())
                fallback=|| view! { <p>"Выберите диалог"</p> }
            >
                <div class="messages">
                    <For
                        each=move || state.thread.with(|thread| thread.messages().to_vec())
                        key=|message| message.id
                        children=move |message: ChatMessage| {
                            let mine = is_mine(&message, me());
                            view! {
                                <p class:mine=mine class:theirs=!mine>{message.message}</p>
                            }
                        }
                    />
                </div>
                <form on:submit=on_send>
                    <input
                        placeholder="сообщение"
                        prop:value=move || draft.get()
                        on:input=move |ev| draft.set(event_target_value(&ev))
                    />
                    <button type="submit" disabled=move || state.loading.get()>"Send"</button>
                </form>
            </Show>
        </section>
    }
}
