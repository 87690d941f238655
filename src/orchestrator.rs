//! # Deployment Orchestrator
//!
//! Entry point for container notifications. On "application created" it
//! gathers the application's REST beans, resolves every web module, binds one
//! listener per endpoint and records the bound address in the active-service
//! list. On "application destroyed" it releases every active service whose
//! context address ends with one of the application's context roots.
//!
//! ## Failure policy
//!
//! | Error | Effect |
//! |-------|--------|
//! | `MissingBeanContext` | bean skipped, recorded in the report |
//! | `AddressComputation` | endpoint skipped, recorded in the report |
//! | anything else | remaining work of the application aborted, error returned |
//!
//! Bindings created before an abort are kept. The application stays marked as
//! deployed, so a later "application destroyed" still releases them. In the
//! same way, an undeploy that could not release every binding leaves the
//! application deployed, and a retried notification picks up what is left.

use crate::address::{compute_address, compute_full_address};
use crate::container::{ClassCatalog, ContainerSystem};
use crate::error::{DeployError, DeployResult};
use crate::model::{
    AppId, ApplicationRecord, BeanRegistration, ClassLoaderRef, EndpointBinding, EndpointTarget,
    Injection, NamingContextRef, ResolvedEndpoint, WebContext, WebModuleRecord,
};
use crate::registry::{HttpTransport, ListenerFactory, ListenerRegistry};
use crate::resolver::{EndpointResolver, RestBeans};
use crate::runtime::RestServiceConfig;
use crate::tracker::{AppState, DeployedSetTracker};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// External collaborators the orchestrator drives.
#[derive(Clone)]
pub struct Collaborators {
    pub container: Arc<dyn ContainerSystem>,
    pub catalog: Arc<dyn ClassCatalog>,
    pub transport: Arc<dyn HttpTransport>,
    pub listeners: Arc<dyn ListenerFactory>,
}

/// Outcome of an "application created" notification.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentReport {
    pub app: AppId,
    /// The notification was a repeat and nothing was done.
    pub already_deployed: bool,
    pub deployed: Vec<EndpointBinding>,
    /// Beans and endpoints skipped without aborting the application.
    pub skipped: Vec<DeployError>,
}

impl DeploymentReport {
    fn new(app: AppId) -> Self {
        Self {
            app,
            already_deployed: false,
            deployed: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// Outcome of an "application destroyed" notification.
#[derive(Debug, Clone, PartialEq)]
pub struct UndeployReport {
    pub app: AppId,
    /// The application was not deployed and nothing was done.
    pub not_deployed: bool,
    pub removed: Vec<String>,
    /// Release and teardown failures, in the order they happened.
    pub failures: Vec<DeployError>,
}

impl UndeployReport {
    fn new(app: AppId) -> Self {
        Self {
            app,
            not_deployed: false,
            removed: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// Per-module environment forwarded to plain-class listeners.
struct ModuleEnv<'a> {
    loader: &'a ClassLoaderRef,
    web: &'a WebContext,
}

pub struct DeploymentOrchestrator {
    container: Arc<dyn ContainerSystem>,
    catalog: Arc<dyn ClassCatalog>,
    listeners: Arc<dyn ListenerFactory>,
    registry: ListenerRegistry,
    tracker: DeployedSetTracker,
    services: Vec<EndpointBinding>,
    applications: IndexMap<AppId, ApplicationRecord>,
    default_loader: ClassLoaderRef,
}

impl DeploymentOrchestrator {
    pub fn new(collaborators: Collaborators, config: &RestServiceConfig) -> Self {
        Self {
            container: collaborators.container,
            catalog: collaborators.catalog,
            listeners: collaborators.listeners,
            registry: ListenerRegistry::new(collaborators.transport, config.virtual_host.clone()),
            tracker: DeployedSetTracker::new(),
            services: Vec::new(),
            applications: IndexMap::new(),
            default_loader: ClassLoaderRef(config.default_class_loader.clone()),
        }
    }

    /// Deploys every REST endpoint of `app`. A repeated notification for an
    /// application that is already deployed is a no-op.
    #[instrument(skip(self, app), fields(app = %app.id))]
    pub async fn application_created(
        &mut self,
        app: &ApplicationRecord,
    ) -> DeployResult<DeploymentReport> {
        let mut report = DeploymentReport::new(app.id.clone());
        if !self.tracker.begin_deploy(&app.id) {
            report.already_deployed = true;
            return Ok(report);
        }
        self.applications.insert(app.id.clone(), app.clone());
        info!(modules = app.web_modules.len(), "Deploying application");

        let result = self.deploy_application(app, &mut report).await;
        self.tracker.finish_deploy(&app.id);
        match result {
            Ok(()) => {
                info!(
                    endpoints = report.deployed.len(),
                    skipped = report.skipped.len(),
                    "Application deployed"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, kept = report.deployed.len(), "Application deployment aborted");
                Err(e)
            }
        }
    }

    /// Releases every endpoint of `app`.
    #[instrument(skip(self, app), fields(app = %app.id))]
    pub async fn application_destroyed(
        &mut self,
        app: &ApplicationRecord,
    ) -> DeployResult<UndeployReport> {
        let mut report = UndeployReport::new(app.id.clone());
        if !self.tracker.begin_undeploy(&app.id) {
            report.not_deployed = true;
            return Ok(report);
        }

        for module in &app.web_modules {
            let root = module.context_root.as_str();
            let matching: Vec<String> = self
                .services
                .iter()
                .filter(|service| service.app == app.id && service.context_address.ends_with(root))
                .map(|service| service.address.clone())
                .collect();
            debug!(module = %module.module_id, matching = matching.len(), "Undeploying module");
            let mut module_released = true;
            for address in matching {
                module_released &= self.undeploy_service(&address, &mut report).await;
            }
            if module_released {
                self.tracker.release_web_module(&app.id, &module.module_id);
            }
        }

        let standalone: Vec<String> = self
            .services
            .iter()
            .filter(|service| service.app == app.id && service.context_root.is_none())
            .map(|service| service.address.clone())
            .collect();
        for address in standalone {
            self.undeploy_service(&address, &mut report).await;
        }

        let stranded = self
            .services
            .iter()
            .filter(|service| service.app == app.id)
            .count();
        if stranded > 0 {
            // stay reachable for a retried destroy notification
            self.tracker.abort_undeploy(&app.id);
            warn!(stranded, failures = report.failures.len(), "Application partially undeployed");
            return Ok(report);
        }

        self.applications.shift_remove(&app.id);
        self.tracker.finish_undeploy(&app.id);
        info!(
            removed = report.removed.len(),
            failures = report.failures.len(),
            "Application undeployed"
        );
        Ok(report)
    }

    /// Undeploys every application still deployed, in deployment order.
    pub async fn undeploy_all(&mut self) -> DeployResult<Vec<UndeployReport>> {
        let records: Vec<ApplicationRecord> = self.applications.values().cloned().collect();
        let mut reports = Vec::with_capacity(records.len());
        for record in &records {
            reports.push(self.application_destroyed(record).await?);
        }
        Ok(reports)
    }

    /// The active-service list, in deployment order.
    pub fn active_services(&self) -> &[EndpointBinding] {
        &self.services
    }

    pub fn registry(&self) -> &ListenerRegistry {
        &self.registry
    }

    pub fn tracker(&self) -> &DeployedSetTracker {
        &self.tracker
    }

    pub fn application_state(&self, app: &AppId) -> Option<AppState> {
        self.tracker.state(app)
    }

    async fn deploy_application(
        &mut self,
        app: &ApplicationRecord,
        report: &mut DeploymentReport,
    ) -> DeployResult<()> {
        let beans = self.gather_rest_beans(app, report);

        for module in &app.web_modules {
            self.deploy_web_module(&app.id, module, &beans, report).await?;
        }

        if app.standalone_module {
            let standalone: Vec<Arc<BeanRegistration>> = beans
                .values()
                .filter(|bean| bean.context_root.is_none())
                .cloned()
                .collect();
            for bean in standalone {
                let endpoint = ResolvedEndpoint::new(EndpointTarget::Bean(bean), None);
                self.deploy_endpoint(&app.id, &endpoint, None, None, report)
                    .await?;
            }
        }
        Ok(())
    }

    /// Looks up every REST bean in the container and attaches the context
    /// root of the web module re-exposing it (the last one wins).
    fn gather_rest_beans(&self, app: &ApplicationRecord, report: &mut DeploymentReport) -> RestBeans {
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for module in &app.web_modules {
            for class in &module.bean_rest_services {
                owners.insert(class.as_str(), module.context_root.as_str());
            }
        }

        let mut beans = RestBeans::new();
        for bean in app.rest_beans() {
            let Some(context) = self.container.bean_context(&bean.deployment_id) else {
                let err = DeployError::MissingBeanContext {
                    deployment_id: bean.deployment_id.clone(),
                    bean_class: bean.bean_class.clone(),
                };
                warn!(error = %err, "Bean skipped");
                report.skipped.push(err);
                continue;
            };
            let registration = BeanRegistration {
                deployment_id: bean.deployment_id.clone(),
                bean_class: context.bean_class,
                class_loader: context.class_loader,
                context_root: owners.get(bean.bean_class.as_str()).map(|root| root.to_string()),
            };
            beans.insert(bean.bean_class.clone(), Arc::new(registration));
        }
        debug!(beans = beans.len(), "REST beans gathered");
        beans
    }

    async fn deploy_web_module(
        &mut self,
        app: &AppId,
        module: &WebModuleRecord,
        beans: &RestBeans,
        report: &mut DeploymentReport,
    ) -> DeployResult<()> {
        let Some(web) = self.container.web_context(&module.module_id) else {
            debug!(module = %module.module_id, "No web context, module skipped");
            return Ok(());
        };
        if !self.tracker.mark_web_module(app, &module.module_id) {
            debug!(module = %module.module_id, "Module already deployed");
            return Ok(());
        }

        let loader = web
            .class_loader
            .clone()
            .unwrap_or_else(|| self.default_loader.clone());
        let endpoints = EndpointResolver::new(self.catalog.as_ref()).resolve(module, &loader, beans)?;

        let env = ModuleEnv {
            loader: &loader,
            web: &web,
        };
        for endpoint in &endpoints {
            self.deploy_endpoint(
                app,
                endpoint,
                Some(module.context_root.as_str()),
                Some(&env),
                report,
            )
            .await?;
        }
        info!(module = %module.module_id, endpoints = endpoints.len(), "Module deployed");
        Ok(())
    }

    /// Binds one endpoint and hands its target to a fresh listener.
    async fn deploy_endpoint(
        &mut self,
        app: &AppId,
        endpoint: &ResolvedEndpoint,
        owner: Option<&str>,
        env: Option<&ModuleEnv<'_>>,
        report: &mut DeploymentReport,
    ) -> DeployResult<()> {
        let class = endpoint.target.resource_class();
        let prefix = endpoint.context_prefix.as_deref();

        let pattern = match compute_address(prefix, class) {
            Ok(pattern) => pattern,
            Err(e) => {
                warn!(class = %class.name, error = %e, "Endpoint skipped");
                report.skipped.push(e);
                return Ok(());
            }
        };

        let loader = match &endpoint.target {
            EndpointTarget::Bean(bean) => bean.class_loader.clone(),
            _ => env.map_or_else(|| self.default_loader.clone(), |env| env.loader.clone()),
        };
        let listener = self.listeners.create_listener();
        let addresses = self
            .registry
            .create(&pattern, listener.clone(), &loader)
            .await?;
        let address = match self.registry.select_primary(&addresses) {
            Ok(address) => address,
            Err(e) => {
                if let Some(first) = addresses.first() {
                    self.registry.remove(first).await?;
                }
                return Err(e);
            }
        };

        let cut = compute_full_address(&address, prefix).and_then(|full| {
            compute_full_address(&address, owner).map(|context| (full, context))
        });
        let (full_address, context_address) = match cut {
            Ok(pair) => pair,
            Err(e) => {
                warn!(class = %class.name, %address, error = %e, "Endpoint skipped, binding released");
                self.registry.remove(&address).await?;
                report.skipped.push(e);
                return Ok(());
            }
        };

        let binding = EndpointBinding {
            app: app.clone(),
            address,
            full_address,
            context_address,
            context_root: owner.map(str::to_string),
            kind: endpoint.target.kind(),
            class_name: class.name.clone(),
        };
        self.services.push(binding.clone());

        match &endpoint.target {
            EndpointTarget::Class { class, descriptor } => {
                let (injections, naming): (&[Injection], Option<&NamingContextRef>) = match env {
                    Some(env) => (&env.web.injections, Some(&env.web.naming_context)),
                    None => (&[], None),
                };
                listener
                    .deploy_class(
                        &binding.full_address,
                        class,
                        descriptor.as_deref(),
                        injections,
                        naming,
                    )
                    .await?;
            }
            EndpointTarget::Singleton {
                instance,
                descriptor,
            } => {
                listener
                    .deploy_singleton(&binding.full_address, instance, descriptor)
                    .await?;
            }
            EndpointTarget::Bean(bean) => {
                listener.deploy_bean(&binding.full_address, bean).await?;
            }
        }

        info!(
            kind = %binding.kind,
            class = %binding.class_name,
            address = %binding.full_address,
            "Endpoint deployed"
        );
        report.deployed.push(binding);
        Ok(())
    }

    /// Returns `false` when the binding could not be released and is still
    /// an active service.
    async fn undeploy_service(&mut self, address: &str, report: &mut UndeployReport) -> bool {
        match self.registry.remove(address).await {
            Ok(listener) => {
                self.services.retain(|service| service.address != address);
                if let Err(e) = listener.undeploy().await {
                    warn!(address, error = %e, "Listener teardown failed");
                    report.failures.push(e);
                }
                info!(address, "Endpoint undeployed");
                report.removed.push(address.to_string());
                true
            }
            Err(e @ DeployError::UnknownAddress(_)) => {
                warn!(address, "Stale active service dropped");
                self.services.retain(|service| service.address != address);
                report.failures.push(e);
                true
            }
            Err(e) => {
                warn!(address, error = %e, "Release failed");
                report.failures.push(e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{InMemoryCatalog, InMemoryContainer, MockTransport, RecordingListenerFactory};

    fn orchestrator() -> DeploymentOrchestrator {
        let collaborators = Collaborators {
            container: Arc::new(InMemoryContainer::new().with_web_module("shop-web", "shop-loader")),
            catalog: Arc::new(InMemoryCatalog::new().with_class("shop.Widgets", Some("widgets"))),
            transport: Arc::new(MockTransport::new(["http://host:8080"])),
            listeners: Arc::new(RecordingListenerFactory::new()),
        };
        DeploymentOrchestrator::new(collaborators, &RestServiceConfig::default())
    }

    #[tokio::test]
    async fn test_stale_active_service_is_dropped_on_undeploy() {
        let mut orchestrator = orchestrator();
        let app = ApplicationRecord::new("shop")
            .with_web_module(WebModuleRecord::new("shop-web", "/app").with_class("shop.Widgets"));
        let report = orchestrator.application_created(&app).await.unwrap();
        let address = report.deployed[0].address.clone();

        // released behind the active-service list's back
        orchestrator.registry.remove(&address).await.unwrap();

        let report = orchestrator.application_destroyed(&app).await.unwrap();

        assert!(report.removed.is_empty());
        assert_eq!(report.failures, vec![DeployError::UnknownAddress(address)]);
        assert!(orchestrator.active_services().is_empty());
        assert_eq!(orchestrator.application_state(&app.id), Some(AppState::Removed));
        assert!(!orchestrator.tracker().is_web_module_deployed(&app.id, "shop-web"));
    }
}
