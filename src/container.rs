//! # Container Collaborators
//!
//! The deployment core never loads classes or looks beans up itself. The
//! surrounding container provides both through the traits below.

use crate::model::{BeanContext, ClassLoaderRef, ResourceApplicationDescriptor, ResourceClass, WebContext};

/// Lookups into the container that owns the deployed applications.
pub trait ContainerSystem: Send + Sync {
    /// The deployed bean for `deployment_id`, if the container knows it.
    fn bean_context(&self, deployment_id: &str) -> Option<BeanContext>;

    /// The environment of a web module, if the container created one.
    fn web_context(&self, module_id: &str) -> Option<WebContext>;
}

/// Descriptor resolution: turns class names into resolved metadata.
///
/// Failures carry a human-readable reason; the caller wraps it into the
/// matching [`DeployError`](crate::DeployError) kind.
pub trait ClassCatalog: Send + Sync {
    /// Loads a resource class and reads its declared resource path.
    fn load_class(&self, name: &str, loader: &ClassLoaderRef) -> Result<ResourceClass, String>;

    /// Instantiates a resource-application descriptor.
    fn instantiate_application(
        &self,
        name: &str,
        loader: &ClassLoaderRef,
    ) -> Result<ResourceApplicationDescriptor, String>;
}
