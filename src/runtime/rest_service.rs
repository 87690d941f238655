use crate::error::{DeployError, DeployResult};
use crate::model::ApplicationRecord;
use crate::orchestrator::{Collaborators, DeploymentOrchestrator, UndeployReport};
use crate::runtime::RestServiceConfig;
use crate::service::{DeploymentClient, DeploymentService};
use tracing::{error, info};

/// The running REST deployment service.
///
/// `RestService` is responsible for:
/// - **Start**: spawning the [`DeploymentService`] and replaying applications
///   the container deployed before the service existed
/// - **Stop**: undeploying everything still deployed and waiting for the
///   service task to finish
///
/// # Example
///
/// ```ignore
/// let service = RestService::start(collaborators, config, already_deployed).await;
///
/// // The container forwards its notifications through the client
/// service.client.application_created(app.clone()).await?;
/// service.client.application_destroyed(app).await?;
///
/// service.stop().await?;
/// ```
pub struct RestService {
    /// Handle used by the container to deliver notifications.
    pub client: DeploymentClient,

    config: RestServiceConfig,
    handle: tokio::task::JoinHandle<()>,
}

impl RestService {
    /// Starts the service and deploys every application in `already_deployed`.
    ///
    /// A failing application is logged and does not prevent the others from
    /// being deployed.
    pub async fn start(
        collaborators: Collaborators,
        config: RestServiceConfig,
        already_deployed: Vec<ApplicationRecord>,
    ) -> Self {
        let orchestrator = DeploymentOrchestrator::new(collaborators, &config);
        let (service, client) = DeploymentService::new(orchestrator, config.buffer_size);
        let handle = tokio::spawn(service.run());
        info!(
            virtual_host = config.virtual_host.as_deref().unwrap_or("-"),
            replay = already_deployed.len(),
            "REST service started"
        );

        for app in already_deployed {
            let id = app.id.clone();
            if let Err(e) = client.application_created(app).await {
                error!(app = %id, error = %e, "Replay failed");
            }
        }

        Self {
            client,
            config,
            handle,
        }
    }

    pub fn config(&self) -> &RestServiceConfig {
        &self.config
    }

    /// Undeploys every application and shuts the service down.
    ///
    /// Clones of [`RestService::client`] held elsewhere keep the service task
    /// alive, so they must be dropped before calling this.
    pub async fn stop(self) -> DeployResult<Vec<UndeployReport>> {
        let reports = self.client.undeploy_all().await?;
        drop(self.client);

        if let Err(e) = self.handle.await {
            error!(error = %e, "Deployment service task failed");
            return Err(DeployError::ServiceDropped);
        }
        info!(applications = reports.len(), "REST service stopped");
        Ok(reports)
    }
}
