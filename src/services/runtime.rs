//! Tokio Runtime Bridge
//!
//! Sync cycles run on one cooperative thread. This module owns a lazily
//! built current-thread runtime and drives futures to completion on it.
//!
//! ```text
//! main
//!   │
//!   ▼
//! block_on(async { sync.sync_all().await })
//!   │
//!   ▼
//! current-thread tokio runtime (fetch is the only await point)
//! ```

use std::future::Future;
use std::sync::OnceLock;

use tokio::runtime::{Builder, Runtime};

use crate::error::{Error, Result};

/// Global single-threaded runtime instance
static TOKIO_RUNTIME: OnceLock<Runtime> = OnceLock::new();

fn get_runtime() -> Result<&'static Runtime> {
    if let Some(runtime) = TOKIO_RUNTIME.get() {
        return Ok(runtime);
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|source| Error::Io { source })?;
    Ok(TOKIO_RUNTIME.get_or_init(|| runtime))
}

/// Block on a future on the shared single-threaded runtime
///
/// **Warning**: This blocks the calling thread and must not be called from
/// inside another runtime.
pub fn block_on<F, T>(future: F) -> Result<T>
where
    F: Future<Output = T>,
{
    Ok(get_runtime()?.block_on(future))
}
