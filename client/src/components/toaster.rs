//! Toast notifications rendered from `UiState`.

#[cfg(test)]
#[path = "toaster_test.rs"]
mod toaster_test;

use leptos::prelude::*;

use crate::state::ui::{ToastLevel, UiState};

/// How long a toast stays on screen.
#[cfg(feature = "hydrate")]
const TOAST_TTL_MS: u32 = 4_000;

#[must_use]
pub fn toast_class(level: ToastLevel) -> &'static str {
    match level {
        ToastLevel::Success => "toast toast--success",
        ToastLevel::Error => "toast toast--error",
    }
}

/// Remove toast `id` after the display timeout (browser only).
pub fn schedule_dismiss(ui: RwSignal<UiState>, id: u64) {
    #[cfg(feature = "hydrate")]
    leptos::task::spawn_local(async move {
        gloo_timers::future::TimeoutFuture::new(TOAST_TTL_MS).await;
        let _ = ui.try_update(|u| u.dismiss_toast(id));
    });
    #[cfg(not(feature = "hydrate"))]
    let _ = (ui, id);
}

#[component]
pub fn Toaster() -> impl IntoView {
    let ui = expect_context::<RwSignal<UiState>>();

    view! {
        <div class="toaster" role="status">
            {move || {
                ui.get()
                    .toasts
                    .into_iter()
                    .map(|toast| {
                        let id = toast.id;
                        view! {
                            <div
                                class=toast_class(toast.level)
                                on:click=move |_| ui.update(|u| u.dismiss_toast(id))
                            >
                                {toast.message}
                            </div>
                        }
                    })
                    .collect_view()
            }}
        </div>
    }
}

