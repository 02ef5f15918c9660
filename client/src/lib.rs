//! # client
//!
//! Leptos frontend for the messenger: the sign-in / sign-up page, the
//! session-driven redirects, and the conversation landing page.
//!
//! The same crate renders on the server (`ssr`) and hydrates in the browser
//! (`hydrate`); network helpers are inert on the server side.

pub mod app;
pub mod components;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;

/// WASM entry point: attach the reactive app to the server-rendered body.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
    leptos::mount::hydrate_body(app::App);
}
