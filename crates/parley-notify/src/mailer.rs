use async_trait::async_trait;
use tracing::debug;

/// Outbound email seam: `(to, subject, html_body) -> success/failure`.
/// The dispatcher never cares which transport sits behind this.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<()>;
}

/// POSTs mail as JSON to the deployment's HTTP mail relay.
pub struct HttpMailer {
    client: reqwest::Client,
    relay_url: String,
    from: String,
}

impl HttpMailer {
    pub fn new(relay_url: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            relay_url,
            from,
        }
    }
}

#[async_trait]
impl EmailTransport for HttpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<()> {
        let resp = self
            .client
            .post(&self.relay_url)
            .json(&serde_json::json!({
                "from": self.from,
                "to": to,
                "subject": subject,
                "html": html_body,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            anyhow::bail!("mail relay returned {}", resp.status());
        }
        Ok(())
    }
}

/// Stands in when no relay URL is configured: logs and drops the mail.
pub struct NoopMailer;

#[async_trait]
impl EmailTransport for NoopMailer {
    async fn send(&self, to: &str, subject: &str, _html_body: &str) -> anyhow::Result<()> {
        debug!("mail relay not configured, dropping email to {to}: {subject}");
        Ok(())
    }
}
