//! Landing page after sign-in: the user's conversations and a logout button.

use leptos::prelude::*;
use leptos_router::hooks::use_navigate;

use crate::components::conversation_list::ConversationList;
use crate::net::types::Conversation;
use crate::state::auth::SessionState;
use crate::util::auth::install_unauth_redirect;

#[component]
pub fn UsersPage() -> impl IntoView {
    let session = expect_context::<RwSignal<SessionState>>();
    let navigate = use_navigate();

    // Re-read the session on entry; a stale `Unauthenticated` from before
    // sign-in must not bounce us back to the auth page.
    session.set(SessionState::default());
    install_unauth_redirect(session, navigate);

    let conversations = RwSignal::new(Vec::<Conversation>::new());
    let loaded = RwSignal::new(false);

    #[cfg(feature = "hydrate")]
    Effect::new(move || {
        leptos::task::spawn_local(async move {
            session.set(crate::net::api::fetch_session().await);
            conversations.set(crate::net::api::fetch_conversations().await);
            loaded.set(true);
        });
    });

    let current_user_id = Signal::derive(move || session.with(|s| s.user.as_ref().map(|u| u.id.clone())));
    let user_name = move || session.with(|s| s.user.as_ref().map_or_else(String::new, |u| u.name.clone()));

    let on_logout = move |_| {
        #[cfg(feature = "hydrate")]
        leptos::task::spawn_local(async move {
            crate::net::api::logout().await;
            session.set(SessionState::unauthenticated());
        });
    };

    view! {
        <div class="users-page">
            <header class="users-page__header">
                <span class="users-page__user">{user_name}</span>
                <button type="button" class="users-page__logout" on:click=on_logout>
                    "Logout"
                </button>
            </header>
            <Show
                when=move || loaded.get()
                fallback=|| view! { <p class="users-page__loading">"Loading..."</p> }
            >
                <Show
                    when=move || conversations.with(|c| !c.is_empty())
                    fallback=|| view! { <p class="users-page__empty">"No conversations yet"</p> }
                >
                    <ConversationList conversations=conversations current_user_id=current_user_id/>
                </Show>
            </Show>
        </div>
    }
}
