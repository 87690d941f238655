//! # Deployed-Set Tracker
//!
//! Remembers which applications and web modules were already processed so
//! that repeated container notifications are no-ops.
//!
//! Each application moves through
//! `NotSeen -> Deploying -> Deployed -> Undeploying -> Removed`. `NotSeen` is
//! simply the absence of an entry. A `Removed` application may be deployed
//! again.

use crate::model::AppId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppState {
    Deploying,
    Deployed,
    Undeploying,
    Removed,
}

impl Display for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AppState::Deploying => "deploying",
            AppState::Deployed => "deployed",
            AppState::Undeploying => "undeploying",
            AppState::Removed => "removed",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Default)]
pub struct DeployedSetTracker {
    applications: HashMap<AppId, AppState>,
    web_modules: HashSet<(AppId, String)>,
}

impl DeployedSetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `app` to `Deploying` if it was never seen or was removed.
    /// Returns `false` when the notification must be ignored.
    pub fn begin_deploy(&mut self, app: &AppId) -> bool {
        match self.applications.get(app) {
            None | Some(AppState::Removed) => {
                self.applications.insert(app.clone(), AppState::Deploying);
                true
            }
            Some(state) => {
                debug!(%app, %state, "Deploy ignored");
                false
            }
        }
    }

    pub fn finish_deploy(&mut self, app: &AppId) {
        if let Some(state) = self.applications.get_mut(app) {
            if *state == AppState::Deploying {
                *state = AppState::Deployed;
            }
        }
    }

    /// Moves `app` to `Undeploying` if it is deployed (or was left mid-way by
    /// a failed deployment). Returns `false` when there is nothing to undo.
    pub fn begin_undeploy(&mut self, app: &AppId) -> bool {
        match self.applications.get_mut(app) {
            Some(state) if matches!(state, AppState::Deploying | AppState::Deployed) => {
                *state = AppState::Undeploying;
                true
            }
            other => {
                debug!(%app, state = ?other, "Undeploy ignored");
                false
            }
        }
    }

    /// Returns `app` to `Deployed` after an undeploy that left bindings
    /// behind.
    pub fn abort_undeploy(&mut self, app: &AppId) {
        if let Some(state) = self.applications.get_mut(app) {
            if *state == AppState::Undeploying {
                *state = AppState::Deployed;
            }
        }
    }

    pub fn finish_undeploy(&mut self, app: &AppId) {
        if let Some(state) = self.applications.get_mut(app) {
            *state = AppState::Removed;
        }
    }

    pub fn state(&self, app: &AppId) -> Option<AppState> {
        self.applications.get(app).copied()
    }

    /// Applications currently holding endpoints, sorted.
    pub fn deployed(&self) -> Vec<AppId> {
        let mut apps: Vec<AppId> = self
            .applications
            .iter()
            .filter(|(_, state)| matches!(state, AppState::Deploying | AppState::Deployed))
            .map(|(app, _)| app.clone())
            .collect();
        apps.sort();
        apps
    }

    /// Marks a web module of `app` as deployed. Returns `false` if it
    /// already was.
    pub fn mark_web_module(&mut self, app: &AppId, module_id: &str) -> bool {
        self.web_modules.insert((app.clone(), module_id.to_string()))
    }

    /// Forgets a web module of `app`. Returns `false` if it was not marked.
    pub fn release_web_module(&mut self, app: &AppId, module_id: &str) -> bool {
        self.web_modules.remove(&(app.clone(), module_id.to_string()))
    }

    pub fn is_web_module_deployed(&self, app: &AppId, module_id: &str) -> bool {
        self.web_modules.contains(&(app.clone(), module_id.to_string()))
    }
}
