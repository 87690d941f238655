//! # Listener Registry
//!
//! Owns the mapping from bound addresses to the listeners serving them. It is
//! the only place bindings are created or released, so it can guarantee that
//! no two live bindings share a pattern or an address.
//!
//! A single `create` may yield several candidate addresses (one per transport
//! connector). They all point at the same listener and are released together.

pub mod listener;
pub mod transport;

pub use listener::*;
pub use transport::*;

use crate::error::{DeployError, DeployResult};
use crate::model::ClassLoaderRef;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

struct Binding {
    pattern: String,
    listener: Arc<dyn RestListener>,
}

/// Address → listener bookkeeping on top of an [`HttpTransport`].
pub struct ListenerRegistry {
    transport: Arc<dyn HttpTransport>,
    virtual_host: Option<String>,
    by_address: HashMap<String, Binding>,
    by_pattern: HashMap<String, Vec<String>>,
}

impl ListenerRegistry {
    pub fn new(transport: Arc<dyn HttpTransport>, virtual_host: Option<String>) -> Self {
        Self {
            transport,
            virtual_host,
            by_address: HashMap::new(),
            by_pattern: HashMap::new(),
        }
    }

    /// Binds `listener` to `pattern` and returns the candidate addresses.
    ///
    /// Rejects a pattern that is already bound, and rolls the transport back if
    /// it hands out an address some other listener already owns.
    pub async fn create(
        &mut self,
        pattern: &str,
        listener: Arc<dyn RestListener>,
        class_loader: &ClassLoaderRef,
    ) -> DeployResult<Vec<String>> {
        if self.by_pattern.contains_key(pattern) {
            warn!(pattern, "Pattern already bound");
            return Err(DeployError::DuplicateBinding(pattern.to_string()));
        }

        let addresses = self
            .transport
            .bind(
                pattern,
                listener.clone(),
                class_loader,
                self.virtual_host.as_deref(),
            )
            .await?;

        if addresses.is_empty() {
            warn!(pattern, "Transport returned no address");
            self.transport.unbind(pattern).await?;
            return Err(DeployError::Transport(format!(
                "no address bound for {pattern}"
            )));
        }

        let mut seen = std::collections::HashSet::new();
        let taken = addresses
            .iter()
            .find(|address| self.by_address.contains_key(*address) || !seen.insert(*address));
        if let Some(taken) = taken {
            let taken = taken.clone();
            warn!(pattern, address = %taken, "Address already bound");
            self.transport.unbind(pattern).await?;
            return Err(DeployError::DuplicateBinding(taken));
        }

        for address in &addresses {
            self.by_address.insert(
                address.clone(),
                Binding {
                    pattern: pattern.to_string(),
                    listener: listener.clone(),
                },
            );
        }
        self.by_pattern.insert(pattern.to_string(), addresses.clone());
        info!(pattern, candidates = addresses.len(), size = self.by_pattern.len(), "Bound");
        Ok(addresses)
    }

    /// Chooses the address to publish, using the transport's policy.
    pub fn select_primary(&self, addresses: &[String]) -> DeployResult<String> {
        let primary = self.transport.select_primary(addresses).ok_or_else(|| {
            DeployError::Transport(format!(
                "no address to publish among {} candidates",
                addresses.len()
            ))
        })?;
        if !addresses.contains(&primary) {
            return Err(DeployError::Transport(format!(
                "{primary} is not one of the bound candidates"
            )));
        }
        Ok(primary)
    }

    /// Releases the binding at `address` (and its sibling candidates) and
    /// returns the detached listener. Tearing the listener down is up to the
    /// caller.
    pub async fn remove(&mut self, address: &str) -> DeployResult<Arc<dyn RestListener>> {
        let Some(binding) = self.by_address.get(address) else {
            warn!(address, "Not bound");
            return Err(DeployError::UnknownAddress(address.to_string()));
        };
        let pattern = binding.pattern.clone();
        let listener = binding.listener.clone();

        self.transport.unbind(&pattern).await?;

        let siblings = self.by_pattern.remove(&pattern).unwrap_or_default();
        for sibling in &siblings {
            self.by_address.remove(sibling);
        }
        self.by_address.remove(address);
        info!(pattern, address, size = self.by_pattern.len(), "Released");
        Ok(listener)
    }

    /// Every bound address, sorted.
    pub fn addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self.by_address.keys().cloned().collect();
        addresses.sort();
        addresses
    }

    /// Every bound pattern, sorted.
    pub fn patterns(&self) -> Vec<String> {
        let mut patterns: Vec<String> = self.by_pattern.keys().cloned().collect();
        patterns.sort();
        patterns
    }

    pub fn contains(&self, address: &str) -> bool {
        let found = self.by_address.contains_key(address);
        debug!(address, found, "Lookup");
        found
    }

    /// Number of bound addresses.
    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }
}
