use std::sync::Arc;

use parley_db::Database;
use parley_db::models::NotificationRow;
use parley_types::kinds::NotificationKind;
use parley_types::prefs::Preferences;
use tracing::{debug, warn};

use crate::mailer::EmailTransport;

/// Turns one stored notification into zero or one email, gated by the
/// recipient's preference flags. Cheap to clone; shares the store handle
/// and transport.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    db: Arc<Database>,
    transport: Arc<dyn EmailTransport>,
}

impl Dispatcher {
    pub fn new(db: Arc<Database>, transport: Arc<dyn EmailTransport>) -> Self {
        Self {
            inner: Arc::new(DispatcherInner { db, transport }),
        }
    }

    /// Fire-and-forget: runs the gate check and send on a detached task.
    /// The notification row has already committed; a transport failure is
    /// logged here and goes nowhere else.
    pub fn maybe_dispatch_email(&self, notification: NotificationRow) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            match dispatch(&inner, &notification).await {
                Ok(true) => debug!("email dispatched for notification {}", notification.id),
                Ok(false) => {}
                Err(e) => warn!(
                    "email dispatch for notification {} failed: {e:#}",
                    notification.id
                ),
            }
        });
    }

    /// Same path without the detached task. Returns whether an email was
    /// actually sent; used by tests and by callers that already own a task.
    pub async fn dispatch_email_now(
        &self,
        notification: &NotificationRow,
    ) -> anyhow::Result<bool> {
        dispatch(&self.inner, notification).await
    }
}

/// Which preference flag covers a notification kind. `system` and
/// `profile_view` never email.
fn email_gate(kind: NotificationKind, prefs: &Preferences) -> bool {
    match kind {
        NotificationKind::Connection => prefs.email_connections,
        NotificationKind::Message => prefs.email_messages,
        NotificationKind::Rfq => prefs.email_rfq,
        NotificationKind::ProfileView | NotificationKind::System => false,
    }
}

async fn dispatch(inner: &DispatcherInner, n: &NotificationRow) -> anyhow::Result<bool> {
    let Some(kind) = NotificationKind::parse(&n.kind) else {
        anyhow::bail!("unknown notification kind '{}'", n.kind);
    };

    // SQLite lookups off the async runtime.
    let db = inner.db.clone();
    let user_id = n.user_id.clone();
    let (prefs, recipient) = tokio::task::spawn_blocking(move || {
        let prefs = db.get_prefs(&user_id)?;
        let recipient = db.get_user(&user_id)?;
        Ok::<_, anyhow::Error>((prefs, recipient))
    })
    .await??;

    if !email_gate(kind, &prefs) {
        debug!(
            "notification {} ({}) gated off by recipient preferences",
            n.id, n.kind
        );
        return Ok(false);
    }

    let Some(recipient) = recipient else {
        anyhow::bail!("recipient {} has no user row", n.user_id);
    };
    if recipient.email.is_empty() {
        anyhow::bail!("recipient {} has no email address", n.user_id);
    }

    let (subject, html) = compose(n, &recipient.display_name);
    inner.transport.send(&recipient.email, &subject, &html).await?;
    Ok(true)
}

fn compose(n: &NotificationRow, display_name: &str) -> (String, String) {
    let subject = n.title.clone();

    let mut html = format!(
        "<p>Hi {},</p><p>{}</p>",
        display_name,
        n.body.as_deref().unwrap_or(&n.title)
    );
    if let Some(link) = &n.link {
        html.push_str(&format!("<p><a href=\"{link}\">View on Parley</a></p>"));
    }

    (subject, html)
}
