//! Per-event record types handed in by the identity pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single SSO endpoint declared in IdP metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SsoEndpoint {
    /// Endpoint location URL.
    pub location: String,

    /// Endpoint binding URN (optional).
    #[serde(default)]
    pub binding: Option<String>,
}

/// Descriptor of the identity provider that authenticated the user.
///
/// All fields are already resolved by the pipeline from IdP metadata; the
/// filter never fetches anything itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdpSource {
    /// IdP entity ID.
    #[serde(default)]
    pub entity_id: Option<String>,

    /// Email domain scopes the IdP declares as its own (empty = none).
    #[serde(default)]
    pub scopes: Vec<String>,

    /// SSO endpoints from IdP metadata; the first entry is the default.
    #[serde(default)]
    pub sso_endpoints: Vec<SsoEndpoint>,
}

impl IdpSource {
    /// Location URL of the default SSO endpoint, if any are declared.
    pub fn default_sso_location(&self) -> Option<&str> {
        self.sso_endpoints.first().map(|e| e.location.as_str())
    }
}

/// The mutable state a processing filter operates on for one login.
///
/// Constructed by the pipeline per authentication event and discarded once
/// the pipeline step completes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeRecord {
    /// User attributes: name -> ordered values.
    #[serde(default)]
    pub attributes: HashMap<String, Vec<String>>,

    /// The authenticating identity provider.
    #[serde(default)]
    pub source: IdpSource,

    /// Pipeline-resolved override for the IdP entity ID, taking precedence
    /// over `source.entity_id` when present.
    #[serde(default)]
    pub idp_override: Option<String>,
}

impl AttributeRecord {
    /// Values of an attribute, if present.
    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.attributes.get(name).map(|v| v.as_slice())
    }

    /// Whether an attribute is present with at least one value.
    pub fn has_non_empty(&self, name: &str) -> bool {
        self.attributes.get(name).is_some_and(|v| !v.is_empty())
    }

    /// Set an attribute, replacing any existing values.
    pub fn set_values(&mut self, name: &str, values: Vec<String>) {
        self.attributes.insert(name.to_string(), values);
    }

    /// Resolve the effective IdP entity ID.
    ///
    /// The pipeline override wins over the source descriptor; empty
    /// strings count as absent.
    pub fn idp_entity_id(&self) -> Option<&str> {
        self.idp_override
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.source.entity_id.as_deref().filter(|s| !s.is_empty()))
    }
}
