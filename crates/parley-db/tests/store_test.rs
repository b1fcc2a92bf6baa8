/// Integration tests for the messaging and notification store: pairwise
/// conversation uniqueness, message ordering and read-state, unread
/// counts, the notification feed and preference upserts.

use std::sync::Arc;
use std::thread;

use parley_db::messages::AppendMessage;
use parley_db::notifications::NewNotification;
use parley_db::{Database, StoreError};
use parley_types::kinds::NotificationKind;
use parley_types::prefs::PreferencesPatch;
use uuid::Uuid;

fn open_db(name: &str) -> Database {
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(
            std::env::temp_dir().join(format!("parley_store_test_{name}.db{suffix}")),
        );
    }
    let path = std::env::temp_dir().join(format!("parley_store_test_{name}.db"));
    Database::open(&path).unwrap()
}

fn seed_user(db: &Database, display_name: &str) -> String {
    let id = Uuid::new_v4().to_string();
    db.insert_user(&id, &format!("{id}@example.com"), display_name, None)
        .unwrap();
    id
}

fn send(db: &Database, conversation_id: &str, sender: &str, content: &str) {
    db.append_message(AppendMessage {
        conversation_id: Some(conversation_id),
        recipient_id: None,
        sender_id: sender,
        content,
    })
    .unwrap();
}

#[test]
fn concurrent_resolve_or_create_yields_one_conversation() {
    let db = Arc::new(open_db("race"));
    let u = seed_user(&db, "Ana");
    let v = seed_user(&db, "Ben");

    let mut handles = Vec::new();
    for i in 0..8 {
        let db = db.clone();
        let (a, b) = (u.clone(), v.clone());
        handles.push(thread::spawn(move || {
            // Half the callers pass the pair in reverse order
            if i % 2 == 0 {
                db.resolve_or_create_conversation(&a, &b).unwrap()
            } else {
                db.resolve_or_create_conversation(&b, &a).unwrap()
            }
        }));
    }

    let ids: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(ids.iter().all(|id| *id == ids[0]));

    assert_eq!(db.list_conversations_for_user(&u).unwrap().len(), 1);
    assert_eq!(db.list_conversations_for_user(&v).unwrap().len(), 1);
}

#[test]
fn first_contact_creates_conversation_and_message_atomically() {
    let db = open_db("first_contact");
    let a = seed_user(&db, "Ana");
    let b = seed_user(&db, "Ben");

    let out = db
        .append_message(AppendMessage {
            conversation_id: None,
            recipient_id: Some(&b),
            sender_id: &a,
            content: "Hola",
        })
        .unwrap();

    assert_eq!(out.other_participant, b);
    assert_eq!(out.message.content, "Hola");

    let inbox = db.list_conversations_for_user(&b).unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].conversation_id, out.message.conversation_id);
    assert_eq!(inbox[0].other_user_id, a);
    assert_eq!(inbox[0].other_display_name, "Ana");
    assert_eq!(inbox[0].last_message_body.as_deref(), Some("Hola"));
    assert_eq!(inbox[0].last_message_at, out.message.created_at);
    assert_eq!(inbox[0].unread_count, 1);

    assert_eq!(db.unread_message_count(&b).unwrap(), 1);
    assert_eq!(db.unread_message_count(&a).unwrap(), 0);

    // A second send from either side reuses the same conversation
    let again = db
        .append_message(AppendMessage {
            conversation_id: None,
            recipient_id: Some(&a),
            sender_id: &b,
            content: "Hi Ana",
        })
        .unwrap();
    assert_eq!(again.message.conversation_id, out.message.conversation_id);
}

#[test]
fn page_returns_oldest_first_with_no_gaps() {
    let db = open_db("ordering");
    let a = seed_user(&db, "Ana");
    let b = seed_user(&db, "Ben");
    let conv = db.resolve_or_create_conversation(&a, &b).unwrap();

    for i in 1..=5 {
        send(&db, &conv, &a, &format!("m{i}"));
    }

    let page = db.page_messages(&conv, &b, 1, 50).unwrap();
    let contents: Vec<&str> = page.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["m1", "m2", "m3", "m4", "m5"]);
}

#[test]
fn page_n_skips_the_most_recent_messages() {
    let db = open_db("paging");
    let a = seed_user(&db, "Ana");
    let b = seed_user(&db, "Ben");
    let conv = db.resolve_or_create_conversation(&a, &b).unwrap();

    for i in 1..=5 {
        send(&db, &conv, &a, &format!("m{i}"));
    }

    let page1 = db.page_messages(&conv, &a, 1, 2).unwrap();
    let page2 = db.page_messages(&conv, &a, 2, 2).unwrap();
    let page3 = db.page_messages(&conv, &a, 3, 2).unwrap();

    let contents = |page: &[parley_db::models::MessageRow]| {
        page.iter().map(|m| m.content.clone()).collect::<Vec<_>>()
    };
    assert_eq!(contents(&page1), ["m4", "m5"]);
    assert_eq!(contents(&page2), ["m2", "m3"]);
    assert_eq!(contents(&page3), ["m1"]);
    assert!(db.page_messages(&conv, &a, 4, 2).unwrap().is_empty());
}

#[test]
fn mark_read_is_idempotent_and_never_marks_own_messages() {
    let db = open_db("read_state");
    let a = seed_user(&db, "Ana");
    let b = seed_user(&db, "Ben");
    let conv = db.resolve_or_create_conversation(&a, &b).unwrap();

    for i in 1..=3 {
        send(&db, &conv, &a, &format!("from A {i}"));
    }
    for i in 1..=2 {
        send(&db, &conv, &b, &format!("from B {i}"));
    }

    assert_eq!(db.unread_message_count(&b).unwrap(), 3);
    assert_eq!(db.unread_message_count(&a).unwrap(), 2);

    assert_eq!(db.mark_conversation_read(&conv, &b).unwrap(), 3);
    assert_eq!(db.unread_message_count(&b).unwrap(), 0);
    // B's own messages stay unread for A
    assert_eq!(db.unread_message_count(&a).unwrap(), 2);

    // Re-invoking is a no-op, never an error, never double-counts
    assert_eq!(db.mark_conversation_read(&conv, &b).unwrap(), 0);
    assert_eq!(db.unread_message_count(&b).unwrap(), 0);
}

#[test]
fn non_participants_get_not_found() {
    let db = open_db("membership");
    let a = seed_user(&db, "Ana");
    let b = seed_user(&db, "Ben");
    let outsider = seed_user(&db, "Cleo");
    let conv = db.resolve_or_create_conversation(&a, &b).unwrap();
    send(&db, &conv, &a, "private");

    assert!(matches!(
        db.page_messages(&conv, &outsider, 1, 50),
        Err(StoreError::NotFound)
    ));
    assert!(matches!(
        db.mark_conversation_read(&conv, &outsider),
        Err(StoreError::NotFound)
    ));
    assert!(matches!(
        db.append_message(AppendMessage {
            conversation_id: Some(&conv),
            recipient_id: None,
            sender_id: &outsider,
            content: "let me in",
        }),
        Err(StoreError::NotFound)
    ));
}

#[test]
fn append_rejects_bad_input() {
    let db = open_db("validation");
    let a = seed_user(&db, "Ana");
    let b = seed_user(&db, "Ben");

    assert!(matches!(
        db.append_message(AppendMessage {
            conversation_id: None,
            recipient_id: Some(&b),
            sender_id: &a,
            content: "   ",
        }),
        Err(StoreError::Validation(_))
    ));
    assert!(matches!(
        db.append_message(AppendMessage {
            conversation_id: None,
            recipient_id: None,
            sender_id: &a,
            content: "no destination",
        }),
        Err(StoreError::Validation(_))
    ));
    assert!(matches!(
        db.resolve_or_create_conversation(&a, &a),
        Err(StoreError::Validation(_))
    ));
}

#[test]
fn inbox_orders_by_most_recent_activity() {
    let db = open_db("inbox_order");
    let a = seed_user(&db, "Ana");
    let b = seed_user(&db, "Ben");
    let c = seed_user(&db, "Cleo");

    let conv_ab = db.resolve_or_create_conversation(&a, &b).unwrap();
    send(&db, &conv_ab, &a, "to Ben");
    let conv_ac = db.resolve_or_create_conversation(&a, &c).unwrap();
    send(&db, &conv_ac, &a, "to Cleo");

    let inbox = db.list_conversations_for_user(&a).unwrap();
    assert_eq!(inbox[0].conversation_id, conv_ac);
    assert_eq!(inbox[1].conversation_id, conv_ab);

    // Fresh activity bumps the A-B conversation back to the top
    send(&db, &conv_ab, &b, "Ben again");
    let inbox = db.list_conversations_for_user(&a).unwrap();
    assert_eq!(inbox[0].conversation_id, conv_ab);
    assert_eq!(inbox[0].unread_count, 1);
}

#[test]
fn notification_feed_lists_newest_first_and_counts_unread() {
    let db = open_db("notifications");
    let u = seed_user(&db, "Ana");

    let payload = serde_json::json!({ "rfq_id": "42" });
    for (kind, title) in [
        (NotificationKind::Connection, "first"),
        (NotificationKind::Rfq, "second"),
        (NotificationKind::Message, "third"),
    ] {
        db.create_notification(NewNotification {
            user_id: &u,
            kind,
            title,
            body: None,
            link: None,
            data: Some(&payload),
        })
        .unwrap();
    }

    let feed = db.list_notifications_for_user(&u, 100).unwrap();
    let titles: Vec<&str> = feed.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, ["third", "second", "first"]);
    assert_eq!(db.unread_notification_count(&u).unwrap(), 3);

    db.mark_notification_read(&feed[0].id, &u).unwrap();
    assert_eq!(db.unread_notification_count(&u).unwrap(), 2);

    // Lenient contract: marking again, or marking a bogus id, is a no-op
    db.mark_notification_read(&feed[0].id, &u).unwrap();
    db.mark_notification_read("no-such-id", &u).unwrap();
    assert_eq!(db.unread_notification_count(&u).unwrap(), 2);

    assert_eq!(db.mark_all_notifications_read(&u).unwrap(), 2);
    assert_eq!(db.unread_notification_count(&u).unwrap(), 0);
}

#[test]
fn foreign_notifications_stay_untouched() {
    let db = open_db("notif_ownership");
    let u = seed_user(&db, "Ana");
    let other = seed_user(&db, "Ben");

    let n = db
        .create_notification(NewNotification {
            user_id: &other,
            kind: NotificationKind::System,
            title: "not yours",
            body: None,
            link: None,
            data: None,
        })
        .unwrap();

    // Silent no-op for a caller naming someone else's notification
    db.mark_notification_read(&n.id, &u).unwrap();
    assert_eq!(db.unread_notification_count(&other).unwrap(), 1);
}

#[test]
fn preference_upsert_is_partial() {
    let db = open_db("prefs");
    let u = seed_user(&db, "Ana");

    // No row yet: defaults are all true
    let prefs = db.get_prefs(&u).unwrap();
    assert!(prefs.email_connections && prefs.email_messages && prefs.email_rfq);
    assert!(prefs.push_enabled);

    db.upsert_prefs(
        &u,
        &PreferencesPatch {
            email_messages: Some(false),
            ..Default::default()
        },
    )
    .unwrap();

    let prefs = db.get_prefs(&u).unwrap();
    assert!(!prefs.email_messages);
    assert!(prefs.email_connections && prefs.email_rfq && prefs.push_enabled);

    // A later patch leaves the earlier flip alone
    db.upsert_prefs(
        &u,
        &PreferencesPatch {
            push_enabled: Some(false),
            ..Default::default()
        },
    )
    .unwrap();

    let prefs = db.get_prefs(&u).unwrap();
    assert!(!prefs.email_messages);
    assert!(!prefs.push_enabled);
    assert!(prefs.email_connections && prefs.email_rfq);
}
