use super::DeploymentRequest;
use crate::error::{DeployError, DeployResult};
use crate::model::{AppId, ApplicationRecord, EndpointBinding};
use crate::orchestrator::{DeploymentReport, UndeployReport};
use crate::tracker::AppState;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, instrument};

/// Cloneable handle used by the container to notify the deployment service.
#[derive(Clone)]
pub struct DeploymentClient {
    sender: mpsc::Sender<DeploymentRequest>,
}

impl DeploymentClient {
    pub fn new(sender: mpsc::Sender<DeploymentRequest>) -> Self {
        Self { sender }
    }

    #[instrument(skip(self, app), fields(app = %app.id))]
    pub async fn application_created(&self, app: ApplicationRecord) -> DeployResult<DeploymentReport> {
        info!("Sending application_created to service");
        let (respond_to, response) = oneshot::channel();
        self.send(DeploymentRequest::ApplicationCreated { app, respond_to })
            .await?;
        response.await.map_err(|_| DeployError::ServiceDropped)?
    }

    #[instrument(skip(self, app), fields(app = %app.id))]
    pub async fn application_destroyed(&self, app: ApplicationRecord) -> DeployResult<UndeployReport> {
        info!("Sending application_destroyed to service");
        let (respond_to, response) = oneshot::channel();
        self.send(DeploymentRequest::ApplicationDestroyed { app, respond_to })
            .await?;
        response.await.map_err(|_| DeployError::ServiceDropped)?
    }

    pub async fn undeploy_all(&self) -> DeployResult<Vec<UndeployReport>> {
        let (respond_to, response) = oneshot::channel();
        self.send(DeploymentRequest::UndeployAll { respond_to }).await?;
        response.await.map_err(|_| DeployError::ServiceDropped)?
    }

    pub async fn active_services(&self) -> DeployResult<Vec<EndpointBinding>> {
        let (respond_to, response) = oneshot::channel();
        self.send(DeploymentRequest::ActiveServices { respond_to })
            .await?;
        response.await.map_err(|_| DeployError::ServiceDropped)?
    }

    pub async fn bound_addresses(&self) -> DeployResult<Vec<String>> {
        let (respond_to, response) = oneshot::channel();
        self.send(DeploymentRequest::BoundAddresses { respond_to })
            .await?;
        response.await.map_err(|_| DeployError::ServiceDropped)?
    }

    pub async fn application_state(&self, app: impl Into<AppId>) -> DeployResult<Option<AppState>> {
        let (respond_to, response) = oneshot::channel();
        self.send(DeploymentRequest::ApplicationState {
            app: app.into(),
            respond_to,
        })
        .await?;
        response.await.map_err(|_| DeployError::ServiceDropped)?
    }

    async fn send(&self, request: DeploymentRequest) -> DeployResult<()> {
        self.sender
            .send(request)
            .await
            .map_err(|_| DeployError::ServiceClosed)
    }
}
