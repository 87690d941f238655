use super::{DeploymentClient, DeploymentRequest};
use crate::orchestrator::DeploymentOrchestrator;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Owns the [`DeploymentOrchestrator`] and serializes every notification.
///
/// Deploy and undeploy of the same application can never interleave: the loop
/// finishes one request before it receives the next. No lock guards the
/// orchestrator's state.
pub struct DeploymentService {
    receiver: mpsc::Receiver<DeploymentRequest>,
    orchestrator: DeploymentOrchestrator,
}

impl DeploymentService {
    pub fn new(orchestrator: DeploymentOrchestrator, buffer_size: usize) -> (Self, DeploymentClient) {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        let service = Self {
            receiver,
            orchestrator,
        };
        (service, DeploymentClient::new(sender))
    }

    /// Processes requests until every client is dropped.
    pub async fn run(mut self) {
        info!("Deployment service started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                DeploymentRequest::ApplicationCreated { app, respond_to } => {
                    debug!(app = %app.id, "ApplicationCreated");
                    let result = self.orchestrator.application_created(&app).await;
                    let _ = respond_to.send(result);
                }
                DeploymentRequest::ApplicationDestroyed { app, respond_to } => {
                    debug!(app = %app.id, "ApplicationDestroyed");
                    let result = self.orchestrator.application_destroyed(&app).await;
                    let _ = respond_to.send(result);
                }
                DeploymentRequest::UndeployAll { respond_to } => {
                    debug!("UndeployAll");
                    let result = self.orchestrator.undeploy_all().await;
                    let _ = respond_to.send(result);
                }
                DeploymentRequest::ActiveServices { respond_to } => {
                    let services = self.orchestrator.active_services().to_vec();
                    debug!(count = services.len(), "ActiveServices");
                    let _ = respond_to.send(Ok(services));
                }
                DeploymentRequest::BoundAddresses { respond_to } => {
                    let _ = respond_to.send(Ok(self.orchestrator.registry().addresses()));
                }
                DeploymentRequest::ApplicationState { app, respond_to } => {
                    let state = self.orchestrator.application_state(&app);
                    debug!(%app, ?state, "ApplicationState");
                    let _ = respond_to.send(Ok(state));
                }
            }
        }

        info!(
            services = self.orchestrator.active_services().len(),
            "Deployment service shutdown"
        );
    }
}
