//! # In-Memory Collaborators
//!
//! Stand-ins for the container, the class catalog, the HTTP transport and the
//! listeners, so the deployment core can be exercised without a server.
//!
//! | Collaborator | Stand-in | What it records |
//! |--------------|----------|-----------------|
//! | [`ContainerSystem`] | [`InMemoryContainer`] | nothing, lookups only |
//! | [`ClassCatalog`] | [`InMemoryCatalog`] | every class it was asked to load |
//! | [`HttpTransport`] | [`MockTransport`] | bound patterns and virtual hosts |
//! | [`ListenerFactory`] | [`RecordingListenerFactory`] | every deploy/undeploy call |
//!
//! # Example
//! ```ignore
//! let transport = Arc::new(MockTransport::new(["http://host:8080"]));
//! let listeners = RecordingListenerFactory::new();
//! // ... deploy through an orchestrator ...
//! assert_eq!(listeners.events().len(), 1);
//! ```

use crate::container::{ClassCatalog, ContainerSystem};
use crate::error::{DeployError, DeployResult};
use crate::model::{
    BeanContext, BeanRegistration, ClassLoaderRef, Injection, NamingContextRef,
    ResourceApplicationDescriptor, ResourceClass, SingletonInstance, WebContext,
};
use crate::registry::{HttpTransport, ListenerFactory, RestListener};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// =============================================================================
// CONTAINER
// =============================================================================

/// A container whose beans and web contexts are registered up front.
#[derive(Debug, Default)]
pub struct InMemoryContainer {
    beans: HashMap<String, BeanContext>,
    web_contexts: HashMap<String, WebContext>,
}

impl InMemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bean(mut self, deployment_id: impl Into<String>, context: BeanContext) -> Self {
        self.beans.insert(deployment_id.into(), context);
        self
    }

    pub fn with_web_context(mut self, module_id: impl Into<String>, context: WebContext) -> Self {
        self.web_contexts.insert(module_id.into(), context);
        self
    }

    /// Registers a web context with no injections, loaded by `loader`.
    pub fn with_web_module(self, module_id: impl Into<String>, loader: &str) -> Self {
        let module_id = module_id.into();
        let context = WebContext {
            class_loader: Some(ClassLoaderRef::from(loader)),
            injections: Vec::new(),
            naming_context: NamingContextRef(format!("java:comp/env/{module_id}")),
        };
        self.with_web_context(module_id, context)
    }
}

impl ContainerSystem for InMemoryContainer {
    fn bean_context(&self, deployment_id: &str) -> Option<BeanContext> {
        self.beans.get(deployment_id).cloned()
    }

    fn web_context(&self, module_id: &str) -> Option<WebContext> {
        self.web_contexts.get(module_id).cloned()
    }
}

// =============================================================================
// CLASS CATALOG
// =============================================================================

/// A catalog of known classes and descriptors.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    classes: HashMap<String, ResourceClass>,
    applications: HashMap<String, ResourceApplicationDescriptor>,
    loaded: Mutex<Vec<String>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, name: &str, path: Option<&str>) -> Self {
        self.classes
            .insert(name.to_string(), ResourceClass::new(name, path));
        self
    }

    pub fn with_application(mut self, descriptor: ResourceApplicationDescriptor) -> Self {
        self.applications
            .insert(descriptor.class_name.clone(), descriptor);
        self
    }

    /// Names passed to `load_class`, in call order.
    pub fn loaded_classes(&self) -> Vec<String> {
        self.loaded.lock().unwrap().clone()
    }
}

impl ClassCatalog for InMemoryCatalog {
    fn load_class(&self, name: &str, _loader: &ClassLoaderRef) -> Result<ResourceClass, String> {
        self.loaded.lock().unwrap().push(name.to_string());
        self.classes
            .get(name)
            .cloned()
            .ok_or_else(|| format!("{name} is not on the class path"))
    }

    fn instantiate_application(
        &self,
        name: &str,
        _loader: &ClassLoaderRef,
    ) -> Result<ResourceApplicationDescriptor, String> {
        self.applications
            .get(name)
            .cloned()
            .ok_or_else(|| format!("{name} has no public no-arg constructor"))
    }
}

// =============================================================================
// TRANSPORT
// =============================================================================

/// A transport exposing every pattern on each of its connectors.
///
/// `bind` returns `connector + pattern` for every connector;
/// `select_primary` publishes the first candidate.
pub struct MockTransport {
    connectors: Vec<String>,
    bound: Mutex<IndexMap<String, Option<String>>>,
    failing: Mutex<Option<String>>,
    failing_unbind: Mutex<Option<String>>,
}

impl MockTransport {
    pub fn new<I, S>(connectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            connectors: connectors
                .into_iter()
                .map(|c| c.into().trim_end_matches('/').to_string())
                .collect(),
            bound: Mutex::new(IndexMap::new()),
            failing: Mutex::new(None),
            failing_unbind: Mutex::new(None),
        }
    }

    /// Makes every later `bind` of `pattern` fail.
    pub fn fail_on(&self, pattern: &str) {
        *self.failing.lock().unwrap() = Some(pattern.to_string());
    }

    /// Makes the next `unbind` of `pattern` fail. Later ones succeed.
    pub fn fail_unbind_once(&self, pattern: &str) {
        *self.failing_unbind.lock().unwrap() = Some(pattern.to_string());
    }

    /// Currently bound patterns, in bind order.
    pub fn bound_patterns(&self) -> Vec<String> {
        self.bound.lock().unwrap().keys().cloned().collect()
    }

    /// Virtual host passed along with each bound pattern, in bind order.
    pub fn virtual_hosts(&self) -> Vec<Option<String>> {
        self.bound.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn bind(
        &self,
        pattern: &str,
        _listener: Arc<dyn RestListener>,
        _class_loader: &ClassLoaderRef,
        virtual_host: Option<&str>,
    ) -> DeployResult<Vec<String>> {
        if self.failing.lock().unwrap().as_deref() == Some(pattern) {
            return Err(DeployError::Transport(format!("cannot bind {pattern}")));
        }
        self.bound
            .lock()
            .unwrap()
            .insert(pattern.to_string(), virtual_host.map(str::to_string));
        Ok(self
            .connectors
            .iter()
            .map(|connector| format!("{connector}{pattern}"))
            .collect())
    }

    fn select_primary(&self, addresses: &[String]) -> Option<String> {
        addresses.first().cloned()
    }

    async fn unbind(&self, pattern: &str) -> DeployResult<()> {
        {
            let mut failing = self.failing_unbind.lock().unwrap();
            if failing.as_deref() == Some(pattern) {
                *failing = None;
                return Err(DeployError::Transport(format!("{pattern} is busy")));
            }
        }
        self.bound.lock().unwrap().shift_remove(pattern);
        Ok(())
    }
}

// =============================================================================
// LISTENERS
// =============================================================================

/// One call received by a [`RecordingListener`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerEvent {
    Class {
        address: String,
        class: String,
        descriptor: Option<String>,
        injections: usize,
    },
    Singleton {
        address: String,
        class: String,
        descriptor: String,
    },
    Bean {
        address: String,
        deployment_id: String,
    },
    /// `address` is the one the listener was deployed at, if any.
    Undeployed { address: Option<String> },
}

/// Hands out [`RecordingListener`]s sharing one event log.
#[derive(Clone, Default)]
pub struct RecordingListenerFactory {
    events: Arc<Mutex<Vec<ListenerEvent>>>,
    failing_class: Option<String>,
    failing_undeploy: bool,
}

impl RecordingListenerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listeners created by this factory refuse to deploy `class`.
    pub fn failing_on(mut self, class: &str) -> Self {
        self.failing_class = Some(class.to_string());
        self
    }

    /// Listeners created by this factory record their teardown, then fail it.
    pub fn failing_undeploy(mut self) -> Self {
        self.failing_undeploy = true;
        self
    }

    pub fn events(&self) -> Vec<ListenerEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ListenerFactory for RecordingListenerFactory {
    fn create_listener(&self) -> Arc<dyn RestListener> {
        Arc::new(RecordingListener {
            events: self.events.clone(),
            failing_class: self.failing_class.clone(),
            failing_undeploy: self.failing_undeploy,
            address: Mutex::new(None),
        })
    }
}

/// A listener that records what it is asked to serve.
pub struct RecordingListener {
    events: Arc<Mutex<Vec<ListenerEvent>>>,
    failing_class: Option<String>,
    failing_undeploy: bool,
    address: Mutex<Option<String>>,
}

impl RecordingListener {
    fn record(&self, address: &str, class: &str, event: ListenerEvent) -> DeployResult<()> {
        if self.failing_class.as_deref() == Some(class) {
            return Err(DeployError::Listener(format!("cannot serve {class}")));
        }
        *self.address.lock().unwrap() = Some(address.to_string());
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

#[async_trait]
impl RestListener for RecordingListener {
    async fn deploy_class(
        &self,
        address: &str,
        class: &ResourceClass,
        descriptor: Option<&ResourceApplicationDescriptor>,
        injections: &[Injection],
        _naming_context: Option<&NamingContextRef>,
    ) -> DeployResult<()> {
        let event = ListenerEvent::Class {
            address: address.to_string(),
            class: class.name.clone(),
            descriptor: descriptor.map(|d| d.class_name.clone()),
            injections: injections.len(),
        };
        self.record(address, &class.name, event)
    }

    async fn deploy_singleton(
        &self,
        address: &str,
        instance: &SingletonInstance,
        descriptor: &ResourceApplicationDescriptor,
    ) -> DeployResult<()> {
        let event = ListenerEvent::Singleton {
            address: address.to_string(),
            class: instance.class.name.clone(),
            descriptor: descriptor.class_name.clone(),
        };
        self.record(address, &instance.class.name, event)
    }

    async fn deploy_bean(&self, address: &str, bean: &BeanRegistration) -> DeployResult<()> {
        let event = ListenerEvent::Bean {
            address: address.to_string(),
            deployment_id: bean.deployment_id.clone(),
        };
        self.record(address, &bean.bean_class.name, event)
    }

    async fn undeploy(&self) -> DeployResult<()> {
        let address = self.address.lock().unwrap().take();
        self.events
            .lock()
            .unwrap()
            .push(ListenerEvent::Undeployed { address });
        if self.failing_undeploy {
            return Err(DeployError::Listener("teardown failed".to_string()));
        }
        Ok(())
    }
}
