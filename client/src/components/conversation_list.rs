//! Sidebar list of the signed-in user's conversations.

#[cfg(test)]
#[path = "conversation_list_test.rs"]
mod conversation_list_test;

use leptos::prelude::*;

use crate::net::types::Conversation;

/// One-line preview of the latest message.
#[must_use]
pub fn last_message_preview(conversation: &Conversation) -> String {
    match conversation.last_message() {
        Some(m) if m.image.is_some() => "Sent an image".to_owned(),
        Some(m) => m.body.clone().unwrap_or_default(),
        None => "Started a conversation".to_owned(),
    }
}

/// Whether the current user has not yet seen the latest message.
#[must_use]
pub fn has_unseen(conversation: &Conversation, current_user_id: Option<&str>) -> bool {
    let (Some(message), Some(me)) = (conversation.last_message(), current_user_id) else {
        return false;
    };
    message.sender.id != me && !message.seen.iter().any(|u| u.id == me)
}

#[component]
pub fn ConversationList(
    conversations: RwSignal<Vec<Conversation>>,
    #[prop(into)] current_user_id: Signal<Option<String>>,
) -> impl IntoView {
    view! {
        <ul class="conversation-list">
            {move || {
                let me = current_user_id.get();
                conversations
                    .get()
                    .into_iter()
                    .map(|c| {
                        let title = c.display_name(me.as_deref());
                        let preview = last_message_preview(&c);
                        let class = if has_unseen(&c, me.as_deref()) {
                            "conversation-list__item conversation-list__item--unseen"
                        } else {
                            "conversation-list__item"
                        };
                        view! {
                            <li class=class>
                                <span class="conversation-list__title">{title}</span>
                                <span class="conversation-list__preview">{preview}</span>
                            </li>
                        }
                    })
                    .collect_view()
            }}
        </ul>
    }
}
