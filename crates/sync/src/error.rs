//! Unified error handling for the synchronization core.
//!
//! Every failure mode here is recoverable by design: a failed durable write
//! rolls the optimistic state back, corrupt session data degrades to an
//! empty wishlist, and stale in-flight responses are discarded. Nothing in
//! this crate is fatal to the surrounding application.

use thiserror::Error;

use wishlist_core::ProductId;

pub use crate::client::ClientError;
pub use crate::config::ConfigError;
pub use crate::session::StorageError;

/// Top-level error type for sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The durable server write failed; the optimistic mutation was rolled
    /// back and the wishlist reflects its pre-operation state.
    #[error("Remote write failed: {0}")]
    Remote(#[from] ClientError),

    /// An add was requested without the item snapshot needed to build it.
    #[error("Missing item details for add of {0}")]
    MissingDetails(ProductId),
}

/// Result type alias for `SyncError`.
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_error_display() {
        let err = SyncError::MissingDetails(ProductId::new("p-1"));
        assert_eq!(err.to_string(), "Missing item details for add of p-1");
    }

    #[test]
    fn test_client_error_converts() {
        let err: SyncError = ClientError::NotAuthenticated.into();
        assert!(matches!(err, SyncError::Remote(ClientError::NotAuthenticated)));
    }
}
