//! Requests accepted by the [`DeploymentService`](super::DeploymentService).

use crate::error::DeployError;
use crate::model::{AppId, ApplicationRecord, EndpointBinding};
use crate::orchestrator::{DeploymentReport, UndeployReport};
use crate::tracker::AppState;
use tokio::sync::oneshot;

/// One-shot response channel used by the service.
pub type Response<T> = oneshot::Sender<Result<T, DeployError>>;

/// Container notifications and read-only queries. The service handles them
/// one at a time, in arrival order.
#[derive(Debug)]
pub enum DeploymentRequest {
    ApplicationCreated {
        app: ApplicationRecord,
        respond_to: Response<DeploymentReport>,
    },
    ApplicationDestroyed {
        app: ApplicationRecord,
        respond_to: Response<UndeployReport>,
    },
    UndeployAll {
        respond_to: Response<Vec<UndeployReport>>,
    },
    ActiveServices {
        respond_to: Response<Vec<EndpointBinding>>,
    },
    BoundAddresses {
        respond_to: Response<Vec<String>>,
    },
    ApplicationState {
        app: AppId,
        respond_to: Response<Option<AppState>>,
    },
}
