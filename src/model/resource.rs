//! Resolved resources: what the container and the class catalog hand back once
//! a name has been looked up.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::{Debug, Display};
use std::sync::Arc;

/// Opaque handle on the class loader owning a module or bean.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassLoaderRef(pub String);

impl From<&str> for ClassLoaderRef {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl Display for ClassLoaderRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle on a module's naming environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamingContextRef(pub String);

/// An injection point the listener must satisfy when it instantiates a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Injection {
    pub name: String,
    pub target: String,
}

/// A loaded resource class and its declared resource path, if any.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceClass {
    pub name: String,
    pub path: Option<String>,
}

impl ResourceClass {
    pub fn new(name: impl Into<String>, path: Option<&str>) -> Self {
        Self {
            name: name.into(),
            path: path.map(str::to_string),
        }
    }
}

/// A singleton exposed by a resource-application descriptor.
///
/// The instance itself is opaque to the deployment core and is only handed
/// over to the listener.
#[derive(Clone)]
pub struct SingletonInstance {
    pub class: ResourceClass,
    pub instance: Arc<dyn Any + Send + Sync>,
}

impl SingletonInstance {
    pub fn new(class: ResourceClass, instance: impl Any + Send + Sync) -> Self {
        Self {
            class,
            instance: Arc::new(instance),
        }
    }
}

impl Debug for SingletonInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingletonInstance")
            .field("class", &self.class.name)
            .finish_non_exhaustive()
    }
}

/// An instantiated resource-application descriptor.
#[derive(Debug, Clone)]
pub struct ResourceApplicationDescriptor {
    pub class_name: String,
    /// Path override declared by the descriptor, appended to the context root.
    pub path: Option<String>,
    pub singletons: Vec<SingletonInstance>,
    pub classes: Vec<ResourceClass>,
}

impl ResourceApplicationDescriptor {
    pub fn new(class_name: impl Into<String>, path: Option<&str>) -> Self {
        Self {
            class_name: class_name.into(),
            path: path.map(str::to_string),
            singletons: Vec::new(),
            classes: Vec::new(),
        }
    }

    pub fn with_singleton(mut self, singleton: SingletonInstance) -> Self {
        self.singletons.push(singleton);
        self
    }

    pub fn with_class(mut self, class: ResourceClass) -> Self {
        self.classes.push(class);
        self
    }
}

/// What the container knows about a deployed bean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeanContext {
    pub bean_class: ResourceClass,
    pub class_loader: ClassLoaderRef,
}

/// A REST-exposable container-managed bean, ready to be deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeanRegistration {
    pub deployment_id: String,
    pub bean_class: ResourceClass,
    pub class_loader: ClassLoaderRef,
    /// Context root of the web module re-exposing the bean. `None` means the
    /// bean is deployed standalone, without a web root.
    pub context_root: Option<String>,
}

/// Per-module environment returned by the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebContext {
    pub class_loader: Option<ClassLoaderRef>,
    #[serde(default)]
    pub injections: Vec<Injection>,
    pub naming_context: NamingContextRef,
}
