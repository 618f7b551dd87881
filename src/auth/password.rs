use anyhow::{Context, Result};

/// bcrypt password hashing with a configurable cost.
#[derive(Clone, Copy, Debug)]
pub struct PasswordEncoder {
    cost: u32,
}

impl PasswordEncoder {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hashing is CPU-bound, so it runs on the blocking pool.
    pub async fn hash(&self, raw: &str) -> Result<String> {
        let raw = raw.to_owned();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(raw, cost))
            .await
            .context("Password hashing task failed")?
            .context("Failed to hash password")
    }

    /// A malformed stored hash counts as a mismatch.
    pub async fn matches(&self, raw: &str, hashed: &str) -> Result<bool> {
        let raw = raw.to_owned();
        let hashed = hashed.to_owned();
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(raw, &hashed))
            .await
            .context("Password verification task failed")?;

        Ok(verified.unwrap_or_else(|err| {
            tracing::warn!("Stored password hash is unreadable: {}", err);
            false
        }))
    }
}
