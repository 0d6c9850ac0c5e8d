use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;
use market_core::chat::ThreadKey;
use market_core::listing::{PageItem, Paginator, SortTab, sort_posts};
use market_core::models::Post;
use market_core::session::NavLink;

use crate::api;
use crate::state::AppState;
use crate::view_model::{card_image, page_label};

pub(crate) fn load_posts(state: AppState) {
    state.loading.set(true);
    state.clear_error();

    spawn_local(async move {
        match api::list_posts().await {
            Ok(posts) => state.posts.set(posts),
            Err(err) => state.set_error(err.to_string()),
        }
        state.loading.set(false);
    });
}

fn load_own_posts(state: AppState, own: RwSignal<Vec<Post>>) {
    let Some(token) = state.token.get_untracked() else {
        state.set_error("Нужна авторизация");
        return;
    };

    state.loading.set(true);
    spawn_local(async move {
        match api::my_posts(&token).await {
            Ok(posts) => own.set(posts),
            Err(err) => state.set_error(err.to_string()),
        }
        state.loading.set(false);
    });
}

fn search(state: AppState, query: String) {
    if query.trim().is_empty() {
        load_posts(state);
        return;
    }

    state.loading.set(true);
    state.clear_error();
    spawn_local(async move {
        match api::search_posts(query.trim()).await {
            Ok(posts) => state.posts.set(posts),
            Err(err) => state.set_error(err.to_string()),
        }
        state.loading.set(false);
    });
}

/// Открывает чат с владельцем объявления.
fn contact_owner(state: AppState, post: &Post) {
    let Some(owner_id) = post.owner_id() else {
        state.set_error("У объявления не указан владелец");
        return;
    };
    let key = ThreadKey::new(owner_id, post.id);
    state.thread.update(|thread| {
        thread.select(key);
    });
    state.page.set(NavLink::Chats);
}

/// Лента объявлений со вкладками сортировки и переключателем страниц.
///
/// С `mine` показывает объявления текущего пользователя вместо общей ленты.
#[component]
pub(crate) fn NoticesPanel(
    state: AppState,
    page_size: usize,
    #[prop(optional)] mine: bool,
) -> impl IntoView {
    let tab = RwSignal::new(SortTab::All);
    let current = RwSignal::new(1_usize);
    let query = RwSignal::new(String::new());
    let own = RwSignal::new(Vec::<Post>::new());

    if mine {
        load_own_posts(state, own);
    }

    let sorted = move || {
        let posts = if mine { own.get() } else { state.posts.get() };
        sort_posts(&posts, tab.get())
    };

    let paginator = move || {
        let mut paginator = Paginator::new(sorted().len(), page_size);
        paginator.set_page(current.get());
        paginator
    };

    let on_search = move |ev: SubmitEvent| {
        ev.prevent_default();
        current.set(1);
        search(state, query.get());
    };

    view! {
        <section class="notices">
            <Show when=move || !mine>
                <form class="search" on:submit=on_search>
                    <input
                        placeholder="поиск"
                        prop:value=move || query.get()
                        on:input=move |ev| query.set(event_target_value(&ev))
                    />
                    <button type="submit" disabled=move || state.loading.get()>"Search"</button>
                </form>
            </Show>

            <div class="tabs">
                {SortTab::ALL
                    .into_iter()
                    .map(|option| {
                        view! {
                            <button
                                class:active=move || tab.get() == option
                                on:click=move |_| {
                                    tab.set(option);
                                    current.set(1);
                                }
                            >
                                {option.label()}
                            </button>
                        }
                    })
                    .collect_view()}
            </div>

            <ul class="cards">
                <For
                    each=move || paginator().slice(&sorted()).to_vec()
                    key=|post| post.id
                    children=move |post: Post| {
                        let image = card_image(&post);
                        let is_closed = post.is_closed;
                        let can_contact = state.session().is_logged_in()
                            && post.owner_id().is_some()
                            && post.owner_id() != state.me();
                        let post_for_contact = post.clone();
                        view! {
                            <li class="card" class:promoted=post.is_promoted>
                                {image.map(|src| view! { <img src=src alt="" /> })}
                                <strong>{post.title.clone()}</strong>
                                <div>{post.price_label()}</div>
                                <small>{format!("просмотры: {}", post.views.unwrap_or_default())}</small>
                                <Show when=move || is_closed>
                                    <small>" · закрыто"</small>
                                </Show>
                                <Show when=move || can_contact>
                                    <button on:click={
                                        let post = post_for_contact.clone();
                                        move |_| contact_owner(state, &post)
                                    }>
                                        "Написать продавцу"
                                    </button>
                                </Show>
                            </li>
                        }
                    }
                />
            </ul>

            <div class="pages">
                {move || {
                    paginator()
                        .items()
                        .into_iter()
                        .map(|item| match item {
                            PageItem::Page { number, current: is_current } => {
                                view! {
                                    <button
                                        class:active=is_current
                                        on:click=move |_| current.set(number)
                                    >
                                        {page_label(item)}
                                    </button>
                                }
                                    .into_any()
                            }
                            PageItem::Ellipsis => view! { <span>{page_label(item)}</span> }.into_any(),
                        })
                        .collect_view()
                }}
            </div>
        </section>
    }
}
