//! Records describing a deployed application, as announced by the container.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Type-safe identifier for applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppId(pub String);

impl From<&str> for AppId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AppId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Display for AppId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A deployed application and everything it may expose over REST.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: AppId,
    pub web_modules: Vec<WebModuleRecord>,
    pub beans: Vec<EnterpriseBeanRecord>,
    /// Standalone (non-web) applications deploy their unclaimed REST beans
    /// at the server root.
    #[serde(default)]
    pub standalone_module: bool,
}

impl ApplicationRecord {
    pub fn new(id: impl Into<AppId>) -> Self {
        Self {
            id: id.into(),
            web_modules: Vec::new(),
            beans: Vec::new(),
            standalone_module: false,
        }
    }

    pub fn with_web_module(mut self, module: WebModuleRecord) -> Self {
        self.web_modules.push(module);
        self
    }

    pub fn with_bean(mut self, bean: EnterpriseBeanRecord) -> Self {
        self.beans.push(bean);
        self
    }

    pub fn standalone(mut self) -> Self {
        self.standalone_module = true;
        self
    }

    /// Beans the container flagged as REST services, in declaration order.
    pub fn rest_beans(&self) -> impl Iterator<Item = &EnterpriseBeanRecord> {
        self.beans.iter().filter(|bean| bean.rest_service)
    }
}

/// A web module of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebModuleRecord {
    pub module_id: String,
    pub context_root: String,
    /// Candidate classes found by scanning.
    #[serde(default)]
    pub rest_classes: Vec<String>,
    /// Resource-application descriptor classes. When non-empty the scanned
    /// classes are ignored.
    #[serde(default)]
    pub rest_applications: Vec<String>,
    /// Bean classes this module re-exposes under its context root.
    #[serde(default)]
    pub bean_rest_services: Vec<String>,
}

impl WebModuleRecord {
    pub fn new(module_id: impl Into<String>, context_root: impl Into<String>) -> Self {
        Self {
            module_id: module_id.into(),
            context_root: context_root.into(),
            rest_classes: Vec::new(),
            rest_applications: Vec::new(),
            bean_rest_services: Vec::new(),
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.rest_classes.push(class.into());
        self
    }

    pub fn with_application(mut self, class: impl Into<String>) -> Self {
        self.rest_applications.push(class.into());
        self
    }

    pub fn with_bean_service(mut self, class: impl Into<String>) -> Self {
        self.bean_rest_services.push(class.into());
        self
    }
}

/// A container-managed bean declared by the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnterpriseBeanRecord {
    pub deployment_id: String,
    pub bean_class: String,
    pub rest_service: bool,
}

impl EnterpriseBeanRecord {
    pub fn rest(deployment_id: impl Into<String>, bean_class: impl Into<String>) -> Self {
        Self {
            deployment_id: deployment_id.into(),
            bean_class: bean_class.into(),
            rest_service: true,
        }
    }
}
