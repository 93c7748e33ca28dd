use async_trait::async_trait;
use uuid::Uuid;

/// Out-of-band delivery of a notification to a user's devices.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn deliver(&self, user_id: Uuid, title: &str, body: &str) -> anyhow::Result<()>;
}

/// Records deliveries in the log only; device delivery is handled elsewhere.
pub struct LogPushSender;

#[async_trait]
impl PushSender for LogPushSender {
    async fn deliver(&self, user_id: Uuid, title: &str, body: &str) -> anyhow::Result<()> {
        tracing::info!(user_id = %user_id, title, body, "Push notification queued");
        Ok(())
    }
}
