//! The HTTP transport the registry binds listeners on.

use crate::error::DeployResult;
use crate::model::ClassLoaderRef;
use crate::registry::RestListener;
use async_trait::async_trait;
use std::sync::Arc;

/// Socket-level binding of listeners, owned by the HTTP server.
///
/// Binding may block while the server starts accepting on a new path; the
/// registry simply awaits the result.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Binds `listener` to `pattern` and returns every address it is now
    /// reachable at (one per connector).
    async fn bind(
        &self,
        pattern: &str,
        listener: Arc<dyn RestListener>,
        class_loader: &ClassLoaderRef,
        virtual_host: Option<&str>,
    ) -> DeployResult<Vec<String>>;

    /// Picks the address to publish among the candidates returned by `bind`.
    fn select_primary(&self, addresses: &[String]) -> Option<String>;

    /// Stops dispatching requests for `pattern`.
    async fn unbind(&self, pattern: &str) -> DeployResult<()>;
}
