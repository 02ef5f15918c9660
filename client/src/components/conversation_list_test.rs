use super::*;
use crate::net::types::{Message, User};

fn user(id: &str) -> User {
    User { id: id.to_owned(), name: id.to_uppercase(), email: None, image: None }
}

fn message(sender: &str, body: Option<&str>, image: Option<&str>, seen: &[&str]) -> Message {
    Message {
        id: "m1".to_owned(),
        conversation_id: "c1".to_owned(),
        body: body.map(str::to_owned),
        image: image.map(str::to_owned),
        created_at: 1,
        sender: user(sender),
        seen: seen.iter().map(|id| user(id)).collect(),
    }
}

fn conversation(messages: Vec<Message>) -> Conversation {
    Conversation {
        id: "c1".to_owned(),
        name: None,
        is_group: false,
        created_at: 0,
        last_message_at: 1,
        user_ids: vec!["me".to_owned(), "bob".to_owned()],
        users: vec![user("me"), user("bob")],
        messages,
    }
}

#[test]
fn preview_without_messages() {
    assert_eq!(last_message_preview(&conversation(Vec::new())), "Started a conversation");
}

#[test]
fn preview_uses_latest_body() {
    let c = conversation(vec![message("bob", Some("old"), None, &[]), message("bob", Some("new"), None, &[])]);
    assert_eq!(last_message_preview(&c), "new");
}

#[test]
fn preview_for_image_message() {
    let c = conversation(vec![message("bob", None, Some("https://img"), &[])]);
    assert_eq!(last_message_preview(&c), "Sent an image");
}

#[test]
fn unseen_when_other_sender_and_not_seen() {
    let c = conversation(vec![message("bob", Some("hi"), None, &["bob"])]);
    assert!(has_unseen(&c, Some("me")));
}

#[test]
fn seen_when_current_user_in_seen_list() {
    let c = conversation(vec![message("bob", Some("hi"), None, &["bob", "me"])]);
    assert!(!has_unseen(&c, Some("me")));
}

#[test]
fn own_message_is_never_unseen() {
    let c = conversation(vec![message("me", Some("hi"), None, &[])]);
    assert!(!has_unseen(&c, Some("me")));
}

#[test]
fn unseen_requires_known_user() {
    let c = conversation(vec![message("bob", Some("hi"), None, &[])]);
    assert!(!has_unseen(&c, None));
}
