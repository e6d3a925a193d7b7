use async_trait::async_trait;
use rand::Rng;
use tracing::info;

/// Delivers verification codes to users.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_otp(&self, email: &str, code: &str) -> anyhow::Result<()>;
}

/// Writes codes to the log instead of sending mail.
#[derive(Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_otp(&self, email: &str, code: &str) -> anyhow::Result<()> {
        info!(%email, otp = %code, "verification code issued");
        Ok(())
    }
}

/// Random 6-digit verification code.
pub fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}
