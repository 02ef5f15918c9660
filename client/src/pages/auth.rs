//! Sign-in / sign-up page with credential form and identity-provider buttons.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::use_navigate;

use crate::components::toaster::schedule_dismiss;
use crate::net::types::Credentials;
use crate::state::auth::{AuthFormState, AuthVariant, SessionState};
use crate::state::ui::{ToastLevel, UiState};
use crate::util::auth::install_authenticated_redirect;
use crate::util::auth_flow::{AuthEffects, SOCIAL_PROVIDERS};

/// Build the request body from raw form inputs, rejecting blank required fields.
///
/// # Errors
///
/// Returns the message to show when a required field is empty.
pub fn credentials_from_inputs(
    variant: AuthVariant,
    name: &str,
    email: &str,
    password: &str,
) -> Result<Credentials, &'static str> {
    if variant.shows_name() && name.trim().is_empty() {
        return Err("Name is required");
    }
    if email.trim().is_empty() {
        return Err("Email is required");
    }
    if password.is_empty() {
        return Err("Password is required");
    }
    Ok(Credentials { name: name.trim().to_owned(), email: email.trim().to_owned(), password: password.to_owned() })
}

#[must_use]
pub fn provider_label(provider: &str) -> &str {
    match provider {
        "github" => "GitHub",
        "google" => "Google",
        other => other,
    }
}

/// Auth flow effects bound to this page's signals and router.
#[derive(Clone)]
pub struct PageEffects<F> {
    form: RwSignal<AuthFormState>,
    ui: RwSignal<UiState>,
    navigate: F,
}

impl<F> AuthEffects for PageEffects<F>
where
    F: Fn(&str, NavigateOptions) + Clone + 'static,
{
    fn set_loading(&self, loading: bool) {
        self.form.update(|f| f.loading = loading);
    }

    fn notify(&self, level: ToastLevel, message: &str) {
        if let Some(id) = self.ui.try_update(|u| u.push_toast(level, message)) {
            schedule_dismiss(self.ui, id);
        }
    }

    fn navigate(&self, path: &str) {
        (self.navigate)(path, NavigateOptions::default());
    }
}

#[component]
pub fn AuthPage() -> impl IntoView {
    let session = expect_context::<RwSignal<SessionState>>();
    let ui = expect_context::<RwSignal<UiState>>();
    let navigate = use_navigate();

    install_authenticated_redirect(session, navigate.clone());

    let form = RwSignal::new(AuthFormState::default());
    let name = RwSignal::new(String::new());
    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let effects = PageEffects { form, ui, navigate };

    let loading = move || form.with(|f| f.loading);
    let variant = move || form.with(|f| f.variant);

    let on_submit = {
        let effects = effects.clone();
        move |ev: leptos::ev::SubmitEvent| {
            ev.prevent_default();
            let variant = form.get_untracked().variant;
            let credentials = match credentials_from_inputs(
                variant,
                &name.get_untracked(),
                &email.get_untracked(),
                &password.get_untracked(),
            ) {
                Ok(c) => c,
                Err(msg) => {
                    effects.notify(ToastLevel::Error, msg);
                    return;
                }
            };

            #[cfg(feature = "hydrate")]
            {
                let flow = crate::util::auth_flow::AuthFlow::new(crate::net::api::HttpAuthApi, effects.clone());
                leptos::task::spawn_local(async move {
                    flow.submit(variant, &credentials).await;
                });
            }

            #[cfg(not(feature = "hydrate"))]
            let _ = credentials;
        }
    };

    let social_buttons = SOCIAL_PROVIDERS
        .into_iter()
        .map(|provider| {
            let effects = effects.clone();
            let on_click = move |_| {
                #[cfg(feature = "hydrate")]
                {
                    let flow = crate::util::auth_flow::AuthFlow::new(crate::net::api::HttpAuthApi, effects.clone());
                    leptos::task::spawn_local(async move {
                        flow.social_action(provider).await;
                    });
                }

                #[cfg(not(feature = "hydrate"))]
                let _ = &effects;
            };
            view! {
                <button type="button" class="auth-social__button" disabled=loading on:click=on_click>
                    {provider_label(provider)}
                </button>
            }
        })
        .collect_view();

    view! {
        <div class="auth-page">
            <h1>{move || if variant() == AuthVariant::Register { "Create an account" } else { "Sign in to your account" }}</h1>
            <form class="auth-form" on:submit=on_submit>
                <Show when=move || variant().shows_name()>
                    <label class="auth-form__field">
                        "Name"
                        <input
                            type="text"
                            prop:value=move || name.get()
                            on:input=move |ev| name.set(event_target_value(&ev))
                            disabled=loading
                        />
                    </label>
                </Show>
                <label class="auth-form__field">
                    "Email address"
                    <input
                        type="email"
                        prop:value=move || email.get()
                        on:input=move |ev| email.set(event_target_value(&ev))
                        disabled=loading
                    />
                </label>
                <label class="auth-form__field">
                    "Password"
                    <input
                        type="password"
                        prop:value=move || password.get()
                        on:input=move |ev| password.set(event_target_value(&ev))
                        disabled=loading
                    />
                </label>
                <button type="submit" class="auth-form__submit" disabled=loading>
                    {move || variant().submit_label()}
                </button>
            </form>
            <p class="auth-page__divider">"Or continue with"</p>
            <div class="auth-social">{social_buttons}</div>
            <div class="auth-page__toggle">
                <span>{move || variant().toggle_prompt()}</span>
                <button
                    type="button"
                    class="auth-page__toggle-link"
                    on:click=move |_| form.update(AuthFormState::toggle_variant)
                >
                    {move || variant().toggle_label()}
                </button>
            </div>
        </div>
    }
}
