use std::collections::BTreeMap;

use crate::{Policy, PolicyError, Secret, SignedPolicy};

/// A policy together with the secret it was registered under.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredPolicy {
    policy: Policy,
    secret: Secret,
}

impl RegisteredPolicy {
    /// The registered policy.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Sign the policy with the secret captured at registration.
    pub fn signature_params(&self) -> Result<SignedPolicy, PolicyError> {
        self.policy.sign(&self.secret)
    }
}

/// Named policies owned by a client or a remote file.
///
/// Cloning a registry copies it: derived files receive a snapshot of their
/// creator's policies, and later registrations on either side are not
/// visible to the other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyRegistry(BTreeMap<String, RegisteredPolicy>);

impl PolicyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `policy` under `name`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::SecretNotSet`] when `secret` is `None`.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        policy: Policy,
        secret: Option<&Secret>,
    ) -> Result<(), PolicyError> {
        let secret = secret.ok_or(PolicyError::SecretNotSet)?.clone();
        self.0
            .insert(name.into(), RegisteredPolicy { policy, secret });
        Ok(())
    }

    /// Look up a registered policy.
    pub fn get(&self, name: &str) -> Option<&RegisteredPolicy> {
        self.0.get(name)
    }

    /// Whether a policy is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Remove a registered policy.
    pub fn remove(&mut self, name: &str) -> Option<RegisteredPolicy> {
        self.0.remove(name)
    }

    /// Registered names in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of registered policies.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no policies are registered.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sign the policy registered under `name`.
    pub fn signature_params(&self, name: &str) -> Result<SignedPolicy, PolicyError> {
        self.get(name)
            .ok_or_else(|| PolicyError::UnknownPolicy(name.to_string()))?
            .signature_params()
    }
}
