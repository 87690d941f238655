//! # Deployment Service
//!
//! Actor wrapper around the [`DeploymentOrchestrator`](crate::orchestrator::DeploymentOrchestrator).
//!
//! The container may deliver notifications from several threads. They all go
//! through a [`DeploymentClient`] into one mailbox, and the
//! [`DeploymentService`] task handles them sequentially.
//!
//! ```text
//! container threads ──► DeploymentClient ──► mpsc ──► DeploymentService
//!                              ▲                            │
//!                              └──────── oneshot ◄──────────┘
//! ```

pub mod actor;
pub mod client;
pub mod message;

pub use actor::*;
pub use client::*;
pub use message::*;
