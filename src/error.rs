//! # Deployment Errors
//!
//! Every failure the deployment core can report. Resolution errors are tied to
//! the unit of work they abort (a class, a descriptor, a module); registry
//! errors are always surfaced to the caller.

use thiserror::Error;

/// Errors that can occur while deploying or undeploying REST endpoints.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DeployError {
    /// A scanned or descriptor-listed class could not be loaded.
    #[error("can't find class {class}: {reason}")]
    ClassResolution { class: String, reason: String },

    /// A resource-application descriptor could not be constructed.
    #[error("can't create resource application {class}: {reason}")]
    DescriptorInstantiation { class: String, reason: String },

    /// A bean flagged as REST-exposable is unknown to the container.
    #[error("no bean context for REST bean {deployment_id} ({bean_class})")]
    MissingBeanContext {
        deployment_id: String,
        bean_class: String,
    },

    /// The composed endpoint URI is malformed.
    #[error("can't compute address for {target}: {reason}")]
    AddressComputation { target: String, reason: String },

    /// A listener is already bound to this pattern or address.
    #[error("a listener is already bound to {0}")]
    DuplicateBinding(String),

    /// No listener is bound at this address.
    #[error("no listener bound at {0}")]
    UnknownAddress(String),

    /// The HTTP transport refused an operation.
    #[error("transport error: {0}")]
    Transport(String),

    /// A listener failed to deploy or tear down a target.
    #[error("listener error: {0}")]
    Listener(String),

    /// The service configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("Deployment service closed")]
    ServiceClosed,
    #[error("Deployment service dropped response channel")]
    ServiceDropped,
}

impl DeployError {
    /// Whether this error only skips a single unit of work instead of
    /// aborting the whole application.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            DeployError::MissingBeanContext { .. } | DeployError::AddressComputation { .. }
        )
    }
}

pub type DeployResult<T> = Result<T, DeployError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_per_endpoint_errors_are_skippable() {
        let missing = DeployError::MissingBeanContext {
            deployment_id: "OrderBean".into(),
            bean_class: "shop.OrderBean".into(),
        };
        let address = DeployError::AddressComputation {
            target: "shop.Orders".into(),
            reason: "template".into(),
        };
        assert!(missing.is_skippable());
        assert!(address.is_skippable());
        assert!(!DeployError::UnknownAddress("/x".into()).is_skippable());
        assert!(!DeployError::ClassResolution {
            class: "shop.Gone".into(),
            reason: "not found".into()
        }
        .is_skippable());
    }

    #[test]
    fn test_messages_name_the_offending_unit() {
        let err = DeployError::DescriptorInstantiation {
            class: "shop.ShopApplication".into(),
            reason: "no default constructor".into(),
        };
        assert_eq!(
            err.to_string(),
            "can't create resource application shop.ShopApplication: no default constructor"
        );
    }
}
