//! Password hashing with bcrypt. Both operations run on the blocking pool.

use std::sync::OnceLock;

use anyhow::Context;

/// Fixed work factor. Hashes stored as `$2b$10$...`.
pub const BCRYPT_COST: u32 = 10;

/// bcrypt only reads the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

pub async fn hash_password(password: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .context("hash task panicked")?
        .context("bcrypt hash failed")
}

/// `Ok(false)` on mismatch. Comparison is done by bcrypt itself.
pub async fn verify_password(password: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .context("verify task panicked")?
        .context("stored password hash is malformed")
}

static DUMMY_HASH: OnceLock<String> = OnceLock::new();

fn dummy_hash() -> anyhow::Result<&'static str> {
    if let Some(hash) = DUMMY_HASH.get() {
        return Ok(hash);
    }
    let hash = bcrypt::hash("zen-social-unknown-account", BCRYPT_COST)?;
    Ok(DUMMY_HASH.get_or_init(|| hash))
}

/// Compute the dummy hash ahead of the first login for an unknown email.
pub async fn init_dummy_hash() -> anyhow::Result<()> {
    tokio::task::spawn_blocking(|| dummy_hash().map(|_| ()))
        .await
        .context("hash task panicked")?
}

/// Runs one cost-10 verification for an account that does not exist, so an
/// unknown email costs the same as a wrong password. Always `Ok(false)`.
pub async fn verify_unknown_account(password: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || {
        let hash = dummy_hash()?;
        bcrypt::verify(password, hash).context("dummy hash is malformed")
    })
    .await
    .context("verify task panicked")?
}
