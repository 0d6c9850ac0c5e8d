//! Браузерный фронтенд доски объявлений на Leptos (CSR).
//!
//! Логика списков, сессии и чата берётся из `market-core`; здесь только
//! сигналы, запросы через `gloo-net` и разметка.
#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

mod storage;
mod view_model;

#[cfg(target_arch = "wasm32")]
mod api;
#[cfg(target_arch = "wasm32")]
mod app;
#[cfg(target_arch = "wasm32")]
mod components;
#[cfg(target_arch = "wasm32")]
mod state;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    leptos::mount::mount_to_body(app::App);
}
