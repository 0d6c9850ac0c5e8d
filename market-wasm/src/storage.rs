use market_core::models::User;
use market_core::session::SessionView;

const TOKEN_KEY: &str = "market_token";
const USER_KEY: &str = "market_user";

fn parse_token(raw: &str) -> Option<String> {
    let token = raw.trim().to_string();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn parse_user(raw: &str) -> Option<User> {
    serde_json::from_str::<User>(raw).ok()
}

/// Сохранённая сессия годится, только если токен ещё действителен.
/// Профиль без живого токена не восстанавливается.
fn restorable(token: Option<String>, user: Option<User>) -> Option<(String, Option<User>)> {
    let token = token?;
    if !SessionView::from_token(Some(&token)).is_logged_in() {
        return None;
    }
    Some((token, user))
}

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Result<web_sys::Storage, String> {
    let window = web_sys::window().ok_or_else(|| "window is not available".to_string())?;
    window
        .local_storage()
        .map_err(|_| "failed to access localStorage".to_string())?
        .ok_or_else(|| "localStorage is not available".to_string())
}

#[cfg(target_arch = "wasm32")]
fn load_token() -> Option<String> {
    let raw = local_storage().ok()?.get_item(TOKEN_KEY).ok()??;
    parse_token(&raw)
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn save_token(token: &str) -> Result<(), String> {
    local_storage()?
        .set_item(TOKEN_KEY, token)
        .map_err(|_| "failed to save token".to_string())
}

#[cfg(target_arch = "wasm32")]
fn load_user() -> Option<User> {
    let raw = local_storage().ok()?.get_item(USER_KEY).ok()??;
    parse_user(&raw)
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn save_user(user: &User) -> Result<(), String> {
    let raw = serde_json::to_string(user).map_err(|_| "failed to serialize user".to_string())?;
    local_storage()?
        .set_item(USER_KEY, &raw)
        .map_err(|_| "failed to save user".to_string())
}

/// Удаляет и токен, и профиль.
#[cfg(target_arch = "wasm32")]
pub(crate) fn clear_session() -> Result<(), String> {
    let storage = local_storage()?;
    storage
        .remove_item(TOKEN_KEY)
        .map_err(|_| "failed to clear token".to_string())?;
    storage
        .remove_item(USER_KEY)
        .map_err(|_| "failed to clear user".to_string())
}

/// Токен и профиль из localStorage. Истёкшая или нечитаемая сессия
/// стирается целиком.
#[cfg(target_arch = "wasm32")]
pub(crate) fn restore_session() -> (Option<String>, Option<User>) {
    match restorable(load_token(), load_user()) {
        Some((token, user)) => (Some(token), user),
        None => {
            if let Err(err) = clear_session() {
                web_sys::console::warn_1(&err.as_str().into());
            }
            (None, None)
        }
    }
}
