//! The message timeline: send, soft delete, replies, reactions, receipts.

use std::sync::Arc;

use huddle::views::DELETED_PLACEHOLDER;
use huddle::{Chat, ChatError, ConversationId, ManualClock, MessageId, Profile, UserId};

fn setup() -> (Chat, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let chat = Chat::open_in_memory(clock.clone()).unwrap();
    (chat, clock)
}

fn join(chat: &Chat, token: &str, name: &str) -> UserId {
    let profile = Profile {
        display_name: Some(name.to_string()),
        email: format!("{token}@example.com"),
        avatar_url: Some(format!("https://img.example.com/{token}.png")),
    };
    chat.sync_identity(Some(token), &profile).unwrap()
}

/// Alice and Bob with a direct conversation between them.
fn pair(chat: &Chat) -> (UserId, UserId, ConversationId) {
    let alice = join(chat, "a", "Alice");
    let bob = join(chat, "b", "Bob");
    let conv = chat.resolve_or_create_direct_conversation(Some("a"), bob).unwrap();
    (alice, bob, conv)
}

#[test]
fn send_appends_and_moves_last_message() {
    let (chat, clock) = setup();
    let (alice, _, conv) = pair(&chat);

    let first = chat.send(Some("a"), conv, "hi bob", None).unwrap();
    clock.advance(10);
    let second = chat.send(Some("b"), conv, "hi alice", None).unwrap();

    let timeline = chat.list_messages(Some("a"), conv).unwrap();
    let ids: Vec<MessageId> = timeline.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![first, second]);

    let mine = &timeline[0];
    assert!(mine.is_me);
    assert_eq!(mine.sender_id, alice);
    assert_eq!(mine.sender_name, "Alice");
    assert_eq!(
        mine.sender_avatar_url.as_deref(),
        Some("https://img.example.com/a.png")
    );
    assert!(!timeline[1].is_me);

    let stored = chat.storage().get_conversation(conv).unwrap().unwrap();
    assert_eq!(stored.last_message_id, Some(second));
}

#[test]
fn timeline_keeps_send_order_when_clock_steps_back() {
    let (chat, clock) = setup();
    let (_, _, conv) = pair(&chat);

    clock.set(10_000);
    let first = chat.send(Some("a"), conv, "before", None).unwrap();
    clock.set(9_000);
    let second = chat.send(Some("b"), conv, "after", None).unwrap();

    let ids: Vec<MessageId> = chat
        .list_messages(Some("a"), conv)
        .unwrap()
        .iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(ids, vec![first, second]);

    let inbox = chat.list_my_conversations(Some("a")).unwrap();
    let last = inbox[0].last_message.as_ref().unwrap();
    assert_eq!(last.id, *ids.last().unwrap());
}

#[test]
fn send_requires_membership_and_content() {
    let (chat, _) = setup();
    let (_, _, conv) = pair(&chat);
    join(&chat, "x", "Outsider");

    assert!(matches!(
        chat.send(Some("x"), conv, "let me in", None),
        Err(ChatError::Forbidden(_))
    ));
    assert!(matches!(
        chat.send(Some("a"), conv, "  \n ", None),
        Err(ChatError::InvalidOperation(_))
    ));
    assert!(chat.list_messages(Some("x"), conv).unwrap().is_empty());
    assert!(chat.list_messages(Some("a"), conv).unwrap().is_empty());
}

#[test]
fn soft_delete_keeps_the_row_and_only_lets_the_sender() {
    let (chat, _) = setup();
    let (_, _, conv) = pair(&chat);
    let msg = chat.send(Some("a"), conv, "oops", None).unwrap();

    assert!(matches!(
        chat.soft_delete(Some("b"), msg),
        Err(ChatError::Forbidden(_))
    ));
    assert!(matches!(
        chat.soft_delete(Some("a"), MessageId(9_999)),
        Err(ChatError::NotFound(_))
    ));

    chat.soft_delete(Some("a"), msg).unwrap();
    let timeline = chat.list_messages(Some("b"), conv).unwrap();
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].id, msg);
    assert!(timeline[0].is_deleted);
    assert_eq!(timeline[0].content, DELETED_PLACEHOLDER);

    let inbox = chat.list_my_conversations(Some("b")).unwrap();
    let last = inbox[0].last_message.as_ref().unwrap();
    assert!(last.is_deleted);
    assert_eq!(last.content, DELETED_PLACEHOLDER);
}

#[test]
fn bulk_delete_skips_foreign_missing_and_deleted() {
    let (chat, _) = setup();
    let (_, _, conv) = pair(&chat);
    let mine_1 = chat.send(Some("a"), conv, "one", None).unwrap();
    let mine_2 = chat.send(Some("a"), conv, "two", None).unwrap();
    let theirs = chat.send(Some("b"), conv, "three", None).unwrap();
    chat.soft_delete(Some("a"), mine_2).unwrap();

    let deleted = chat
        .bulk_soft_delete(Some("a"), &[mine_1, mine_2, theirs, MessageId(9_999)])
        .unwrap();
    assert_eq!(deleted, 1);

    let timeline = chat.list_messages(Some("a"), conv).unwrap();
    let flags: Vec<bool> = timeline.iter().map(|m| m.is_deleted).collect();
    assert_eq!(flags, vec![true, true, false]);
    assert_eq!(timeline[2].content, "three");
}

#[test]
fn replies_quote_with_placeholder_after_deletion() {
    let (chat, _) = setup();
    let (_, _, conv) = pair(&chat);
    let original = chat.send(Some("a"), conv, "lunch?", None).unwrap();
    let reply = chat.send(Some("b"), conv, "yes!", Some(original)).unwrap();

    let timeline = chat.list_messages(Some("a"), conv).unwrap();
    let quoted = timeline[1].reply_to.as_ref().unwrap();
    assert_eq!(timeline[1].id, reply);
    assert_eq!(quoted.id, original);
    assert_eq!(quoted.sender_name, "Alice");
    assert_eq!(quoted.content, "lunch?");
    assert!(!quoted.is_deleted);

    chat.soft_delete(Some("a"), original).unwrap();
    let timeline = chat.list_messages(Some("b"), conv).unwrap();
    let quoted = timeline[1].reply_to.as_ref().unwrap();
    assert!(quoted.is_deleted);
    assert_eq!(quoted.content, DELETED_PLACEHOLDER);
}

#[test]
fn replies_do_not_leak_other_conversations() {
    let (chat, _) = setup();
    let (_, bob, conv) = pair(&chat);
    let carol = join(&chat, "c", "Carol");
    let secret_conv = chat.resolve_or_create_direct_conversation(Some("b"), carol).unwrap();
    let secret = chat.send(Some("c"), secret_conv, "secret", None).unwrap();

    chat.send(Some("b"), conv, "look", Some(secret)).unwrap();
    chat.send(Some("b"), conv, "gone", Some(MessageId(9_999))).unwrap();

    let timeline = chat.list_messages(Some("a"), conv).unwrap();
    assert_eq!(timeline.len(), 2);
    assert!(timeline.iter().all(|m| m.reply_to.is_none()));
    assert!(timeline.iter().all(|m| m.sender_id == bob));
}

#[test]
fn reactions_toggle_per_user_and_emoji() {
    let (chat, _) = setup();
    let (_, _, conv) = pair(&chat);
    join(&chat, "x", "Outsider");
    let msg = chat.send(Some("a"), conv, "ship it", None).unwrap();

    assert!(chat.toggle_reaction(Some("a"), msg, "👍").unwrap());
    assert!(chat.toggle_reaction(Some("b"), msg, "👍").unwrap());
    assert!(chat.toggle_reaction(Some("b"), msg, "🎉").unwrap());

    let view = &chat.list_messages(Some("a"), conv).unwrap()[0];
    let folded: Vec<(&str, u32, bool)> = view
        .reactions
        .iter()
        .map(|r| (r.emoji.as_str(), r.count, r.has_reacted))
        .collect();
    assert_eq!(folded, vec![("👍", 2, true), ("🎉", 1, false)]);

    // Second toggle removes.
    assert!(!chat.toggle_reaction(Some("a"), msg, "👍").unwrap());
    let view = &chat.list_messages(Some("b"), conv).unwrap()[0];
    let folded: Vec<(&str, u32, bool)> = view
        .reactions
        .iter()
        .map(|r| (r.emoji.as_str(), r.count, r.has_reacted))
        .collect();
    assert_eq!(folded, vec![("👍", 1, true), ("🎉", 1, true)]);

    assert!(matches!(
        chat.toggle_reaction(Some("x"), msg, "👀"),
        Err(ChatError::Forbidden(_))
    ));
    assert!(matches!(
        chat.toggle_reaction(Some("a"), MessageId(9_999), "👀"),
        Err(ChatError::NotFound(_))
    ));
    assert!(matches!(
        chat.toggle_reaction(Some("a"), msg, " "),
        Err(ChatError::InvalidOperation(_))
    ));
}

#[test]
fn mark_as_read_never_records_the_sender() {
    let (chat, _) = setup();
    let (alice, bob, conv) = pair(&chat);
    let from_alice = chat.send(Some("a"), conv, "1", None).unwrap();
    chat.send(Some("b"), conv, "2", None).unwrap();
    chat.send(Some("b"), conv, "3", None).unwrap();

    assert_eq!(chat.list_my_conversations(Some("a")).unwrap()[0].unread_count, 2);
    assert_eq!(chat.list_my_conversations(Some("b")).unwrap()[0].unread_count, 1);

    assert_eq!(chat.mark_as_read(Some("a"), conv).unwrap(), 2);
    assert_eq!(chat.mark_as_read(Some("a"), conv).unwrap(), 0);
    assert_eq!(chat.list_my_conversations(Some("a")).unwrap()[0].unread_count, 0);

    let own = chat.storage().get_message(from_alice).unwrap().unwrap();
    assert!(!own.read_by.contains(alice));
    assert!(!own.read_by.contains(bob));

    let timeline = chat.list_messages(Some("a"), conv).unwrap();
    let counts: Vec<usize> = timeline.iter().map(|m| m.read_count).collect();
    assert_eq!(counts, vec![0, 1, 1]);
}

#[test]
fn mark_as_read_ignores_non_members() {
    let (chat, _) = setup();
    let (_, _, conv) = pair(&chat);
    join(&chat, "x", "Outsider");
    chat.send(Some("a"), conv, "private", None).unwrap();

    assert_eq!(chat.mark_as_read(Some("x"), conv).unwrap(), 0);
    let timeline = chat.list_messages(Some("b"), conv).unwrap();
    assert_eq!(timeline[0].read_count, 0);
}
