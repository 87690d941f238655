//! Resolution output and the bookkeeping kept for every bound endpoint.

use crate::model::{AppId, BeanRegistration, ResourceApplicationDescriptor, ResourceClass, SingletonInstance};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;

/// How a target is handed to its listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    Class,
    Singleton,
    Bean,
}

impl Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetKind::Class => write!(f, "class"),
            TargetKind::Singleton => write!(f, "singleton"),
            TargetKind::Bean => write!(f, "bean"),
        }
    }
}

/// The thing backing an endpoint.
#[derive(Debug, Clone)]
pub enum EndpointTarget {
    /// A plain class the listener instantiates itself.
    Class {
        class: ResourceClass,
        descriptor: Option<Arc<ResourceApplicationDescriptor>>,
    },
    /// An instance supplied by a resource-application descriptor.
    Singleton {
        instance: SingletonInstance,
        descriptor: Arc<ResourceApplicationDescriptor>,
    },
    /// A container-managed bean; never instantiated directly.
    Bean(Arc<BeanRegistration>),
}

impl EndpointTarget {
    pub fn kind(&self) -> TargetKind {
        match self {
            EndpointTarget::Class { .. } => TargetKind::Class,
            EndpointTarget::Singleton { .. } => TargetKind::Singleton,
            EndpointTarget::Bean(_) => TargetKind::Bean,
        }
    }

    /// The class whose declared path contributes to the endpoint address.
    pub fn resource_class(&self) -> &ResourceClass {
        match self {
            EndpointTarget::Class { class, .. } => class,
            EndpointTarget::Singleton { instance, .. } => &instance.class,
            EndpointTarget::Bean(bean) => &bean.bean_class,
        }
    }
}

/// One target to deploy and the context prefix it lives under.
#[derive(Debug, Clone)]
pub struct ResolvedEndpoint {
    pub target: EndpointTarget,
    /// `None` for standalone beans deployed without a web root.
    pub context_prefix: Option<String>,
}

impl ResolvedEndpoint {
    pub fn new(target: EndpointTarget, context_prefix: Option<String>) -> Self {
        Self {
            target,
            context_prefix,
        }
    }
}

/// An entry of the active-service list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointBinding {
    pub app: AppId,
    /// Primary address chosen among the registry candidates.
    pub address: String,
    /// Address handed to the listener (bound address cut at the endpoint's
    /// context prefix).
    pub full_address: String,
    /// Bound address cut at the owning module's context root. Undeploy
    /// matches on its suffix.
    pub context_address: String,
    /// Context root of the owning web module, `None` for standalone beans.
    pub context_root: Option<String>,
    pub kind: TargetKind,
    pub class_name: String,
}
