//! Error types for the pool

use crate::registry::ResourceHandle;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum PoolError {
    #[error("pool `{pool}` has been disposed and no longer accepts operations")]
    Disposed { pool: String },

    #[error(
        "resource kind `{kind}` in pool `{pool}` has no activation capability; \
         override the acquire/release hooks for this kind"
    )]
    UnsupportedResource { pool: String, kind: &'static str },

    #[error("duplicate release of {handle:?} in pool `{pool}`")]
    DuplicateRelease {
        pool: String,
        handle: ResourceHandle,
    },

    #[error("{handle:?} is not tracked by pool `{pool}`")]
    UnknownHandle {
        pool: String,
        handle: ResourceHandle,
    },

    #[error("lifecycle hook failed: {0}")]
    Hook(String),
}

impl PoolError {
    /// Attach the pool name to errors raised below the pool boundary.
    /// Lifecycle hooks do not know which pool they serve, so they leave the
    /// `pool` field empty and the pool fills it in on the way out.
    pub(crate) fn with_pool(mut self, name: &str) -> Self {
        match &mut self {
            PoolError::Disposed { pool }
            | PoolError::UnsupportedResource { pool, .. }
            | PoolError::DuplicateRelease { pool, .. }
            | PoolError::UnknownHandle { pool, .. } => {
                if pool.is_empty() {
                    *pool = name.to_string();
                }
            }
            PoolError::Hook(_) => {}
        }
        self
    }
}

pub type PoolResult<T> = Result<T, PoolError>;
