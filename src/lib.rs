//! # REST Deployer
//!
//! > **Publishes the REST endpoints of deployed applications on an HTTP transport.**
//!
//! When the container announces that an application was created, this crate
//! works out which resource classes, descriptor singletons and container-managed
//! beans each web module exposes, computes their external addresses, binds one
//! listener per endpoint and remembers what it bound. When the application is
//! destroyed it releases exactly those bindings.
//!
//! ## Control Flow
//!
//! ```text
//! container ──► DeploymentClient ──► DeploymentService ──► DeploymentOrchestrator
//!                                                              │
//!        ┌───────────────┬──────────────────┬─────────────────┤
//!        ▼               ▼                  ▼                 ▼
//!   tracker         resolver            address           registry ──► HttpTransport
//!  "done yet?"   "which targets?"   "which pattern?"    "bind listener"
//! ```
//!
//! ## Module Tour
//!
//! ### 1. Pure building blocks
//! - [`address`]: context prefix + class path → `/app/widgets/.*` pattern, and
//!   bound address → full address handed to the listener.
//! - [`resolver`]: decides the endpoints of one web module. Beans win over plain
//!   classes, and descriptors replace scanning.
//! - [`tracker`]: idempotency markers for applications and web modules.
//!
//! ### 2. Stateful core
//! - [`registry`]: address → listener bookkeeping on top of an [`HttpTransport`](registry::HttpTransport).
//! - [`orchestrator`]: composes everything on create/destroy notifications.
//!
//! ### 3. Runtime
//! - [`service`]: actor owning the orchestrator, so notifications never interleave.
//! - [`runtime`]: start/stop, configuration and tracing setup.
//!
//! ### 4. Seams
//! - [`container`], [`registry::RestListener`], [`registry::HttpTransport`]:
//!   traits the hosting server implements.
//! - [`mock`]: in-memory implementations for tests and the demo.
//!
//! ## Running the Demo
//!
//! ```bash
//! RUST_LOG=info cargo run
//! ```

pub mod address;
pub mod container;
pub mod error;
pub mod mock;
pub mod model;
pub mod orchestrator;
pub mod registry;
pub mod resolver;
pub mod runtime;
pub mod service;
pub mod tracker;

pub use error::{DeployError, DeployResult};
pub use orchestrator::{Collaborators, DeploymentOrchestrator, DeploymentReport, UndeployReport};
pub use runtime::{setup_tracing, RestService, RestServiceConfig};
pub use service::{DeploymentClient, DeploymentService};
