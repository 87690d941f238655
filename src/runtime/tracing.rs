//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered
//! by `RUST_LOG`.
//!
//! ## What Gets Traced
//!
//! | Level | Events |
//! |-------|--------|
//! | `info` | service start/stop, each endpoint and application deployed or undeployed |
//! | `debug` | skipped modules, tracker decisions, every request reaching the service |
//! | `warn` | skipped beans and endpoints, aborted deployments, failed releases |
//!
//! Orchestrator entry points run inside an `app` span, so every line emitted
//! while deploying carries the application id:
//!
//! ```text
//! INFO application_created{app=shop}: Deploying application modules=1
//! INFO application_created{app=shop}: Endpoint deployed kind=class class=shop.Widgets address=http://host:8080/app
//! INFO application_created{app=shop}: Application deployed endpoints=1 skipped=0
//! ```
//!
//! ```bash
//! RUST_LOG=info cargo run
//! RUST_LOG=rest_deployer::registry=debug cargo run
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
