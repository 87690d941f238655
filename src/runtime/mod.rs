//! Runtime lifecycle management.
//!
//! This module contains the infrastructure around the deployment core:
//!
//! - **Service lifecycle**: starting the deployment service, replaying
//!   applications, undeploying everything on stop
//! - **Configuration**: virtual host, mailbox size and default class loader
//! - **Observability setup**: initializing tracing and logging
//!
//! # Main Components
//!
//! - [`RestService`] - Starts and stops the deployment service
//! - [`RestServiceConfig`] - Settings read from init properties or the environment
//! - [`setup_tracing`] - Initializes the tracing/logging infrastructure

pub mod config;
pub mod rest_service;
pub mod tracing;

pub use config::*;
pub use rest_service::*;
pub use self::tracing::*;
