//! The listener side: what a bound endpoint does with its target.

use crate::error::DeployResult;
use crate::model::{
    BeanRegistration, Injection, NamingContextRef, ResourceApplicationDescriptor, ResourceClass,
    SingletonInstance,
};
use async_trait::async_trait;
use std::sync::Arc;

/// A request-dispatch unit serving one bound endpoint.
///
/// Exactly one of the `deploy_*` methods is called after the listener is
/// bound, then `undeploy` once its binding is removed.
#[async_trait]
pub trait RestListener: Send + Sync {
    /// Serves a plain class the listener instantiates itself.
    async fn deploy_class(
        &self,
        address: &str,
        class: &ResourceClass,
        descriptor: Option<&ResourceApplicationDescriptor>,
        injections: &[Injection],
        naming_context: Option<&NamingContextRef>,
    ) -> DeployResult<()>;

    /// Serves an instance supplied by a resource-application descriptor.
    async fn deploy_singleton(
        &self,
        address: &str,
        instance: &SingletonInstance,
        descriptor: &ResourceApplicationDescriptor,
    ) -> DeployResult<()>;

    /// Serves a container-managed bean.
    async fn deploy_bean(&self, address: &str, bean: &BeanRegistration) -> DeployResult<()>;

    /// Releases whatever the listener deployed.
    async fn undeploy(&self) -> DeployResult<()>;
}

/// Creates a fresh listener for every endpoint.
pub trait ListenerFactory: Send + Sync {
    fn create_listener(&self) -> Arc<dyn RestListener>;
}
