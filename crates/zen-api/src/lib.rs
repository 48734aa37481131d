pub mod auth;
pub mod communities;
mod convert;
pub mod error;
pub mod extract;
pub mod messages;
pub mod middleware;
pub mod password;
pub mod profile;
pub mod replies;
pub mod routes;
pub mod token;
pub mod topics;
pub mod validation;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
pub use routes::router;

use tracing::error;

/// Run store or CPU-bound work off the async runtime.
pub(crate) async fn run_blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(e.into())
    })?
}
