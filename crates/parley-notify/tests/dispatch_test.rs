/// Dispatcher tests: preference gating verified against a recording
/// transport, and the fire-and-forget contract against a failing one.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use parley_db::Database;
use parley_db::models::NotificationRow;
use parley_db::notifications::NewNotification;
use parley_notify::{Dispatcher, EmailTransport};
use parley_types::kinds::NotificationKind;
use parley_types::prefs::PreferencesPatch;
use uuid::Uuid;

struct RecordingMailer {
    calls: AtomicUsize,
    last: Mutex<Option<(String, String, String)>>,
}

impl RecordingMailer {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }
}

#[async_trait]
impl EmailTransport for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some((to.into(), subject.into(), html_body.into()));
        Ok(())
    }
}

struct FailingMailer {
    calls: AtomicUsize,
}

#[async_trait]
impl EmailTransport for FailingMailer {
    async fn send(&self, _to: &str, _subject: &str, _html_body: &str) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("transport down")
    }
}

fn open_db(name: &str) -> Arc<Database> {
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(
            std::env::temp_dir().join(format!("parley_dispatch_test_{name}.db{suffix}")),
        );
    }
    let path = std::env::temp_dir().join(format!("parley_dispatch_test_{name}.db"));
    Arc::new(Database::open(&path).unwrap())
}

fn seed_user(db: &Database, display_name: &str) -> String {
    let id = Uuid::new_v4().to_string();
    db.insert_user(&id, &format!("{id}@example.com"), display_name, None)
        .unwrap();
    id
}

fn message_notification(db: &Database, user_id: &str) -> NotificationRow {
    db.create_notification(NewNotification {
        user_id,
        kind: NotificationKind::Message,
        title: "New message from Ana",
        body: Some("Hola"),
        link: Some("/messages/c1"),
        data: None,
    })
    .unwrap()
}

#[tokio::test]
async fn gated_in_sends_exactly_one_email() {
    let db = open_db("gated_in");
    let u = seed_user(&db, "Ben");
    let mailer = Arc::new(RecordingMailer::new());
    let dispatcher = Dispatcher::new(db.clone(), mailer.clone());

    let n = message_notification(&db, &u);
    let sent = dispatcher.dispatch_email_now(&n).await.unwrap();

    assert!(sent);
    assert_eq!(mailer.calls.load(Ordering::SeqCst), 1);

    let (to, subject, html) = mailer.last.lock().unwrap().clone().unwrap();
    assert_eq!(to, format!("{u}@example.com"));
    assert_eq!(subject, "New message from Ana");
    assert!(html.contains("Hi Ben"));
}

#[tokio::test]
async fn gated_out_never_touches_the_transport() {
    let db = open_db("gated_out");
    let u = seed_user(&db, "Ben");
    db.upsert_prefs(
        &u,
        &PreferencesPatch {
            email_messages: Some(false),
            ..Default::default()
        },
    )
    .unwrap();

    let mailer = Arc::new(RecordingMailer::new());
    let dispatcher = Dispatcher::new(db.clone(), mailer.clone());

    let n = message_notification(&db, &u);
    let sent = dispatcher.dispatch_email_now(&n).await.unwrap();

    assert!(!sent);
    assert_eq!(mailer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn system_and_profile_view_kinds_never_email() {
    let db = open_db("system_kind");
    let u = seed_user(&db, "Ben");
    let mailer = Arc::new(RecordingMailer::new());
    let dispatcher = Dispatcher::new(db.clone(), mailer.clone());

    for kind in [NotificationKind::System, NotificationKind::ProfileView] {
        let n = db
            .create_notification(NewNotification {
                user_id: &u,
                kind,
                title: "housekeeping",
                body: None,
                link: None,
                data: None,
            })
            .unwrap();
        assert!(!dispatcher.dispatch_email_now(&n).await.unwrap());
    }

    assert_eq!(mailer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn transport_failure_is_swallowed_by_fire_and_forget() {
    let db = open_db("swallowed");
    let u = seed_user(&db, "Ben");
    let mailer = Arc::new(FailingMailer {
        calls: AtomicUsize::new(0),
    });
    let dispatcher = Dispatcher::new(db.clone(), mailer.clone());

    let n = message_notification(&db, &u);
    let notification_id = n.id.clone();

    // Detached path: the failure surfaces only as a log line
    dispatcher.maybe_dispatch_email(n);
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(mailer.calls.load(Ordering::SeqCst), 1);
    // The notification row committed before dispatch and stays committed
    let feed = db.list_notifications_for_user(&u, 10).unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].id, notification_id);
}

#[tokio::test]
async fn missing_recipient_row_is_a_delivery_failure() {
    let db = open_db("missing_user");
    let mailer = Arc::new(RecordingMailer::new());
    let dispatcher = Dispatcher::new(db.clone(), mailer.clone());

    // Hand-built row for a user the store has never seen
    let n = NotificationRow {
        id: Uuid::new_v4().to_string(),
        user_id: Uuid::new_v4().to_string(),
        kind: "message".into(),
        title: "orphan".into(),
        body: None,
        link: None,
        data: None,
        read_at: None,
        created_at: "2026-01-01T00:00:00Z".into(),
    };

    assert!(dispatcher.dispatch_email_now(&n).await.is_err());
    assert_eq!(mailer.calls.load(Ordering::SeqCst), 0);
}
