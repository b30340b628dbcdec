//! Filter configuration.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Configuration for the verified-email filter.
///
/// Constructed once from the pipeline's filter configuration and immutable
/// thereafter. External keys use the camelCase spelling of the deployed
/// filter configuration surface (`emailAttribute`, `replace`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FilterConfig {
    /// Attribute containing the user's email address(es).
    #[serde(default = "default_email_attribute")]
    pub email_attribute: String,

    /// Attribute receiving the user's verified email address(es).
    #[serde(default = "default_verified_email_attribute")]
    pub verified_email_attribute: String,

    /// IdP entity IDs unconditionally trusted to assert verified email.
    /// Every email value from these IdPs is copied verbatim.
    #[serde(default)]
    pub idp_entity_id_include_list: Vec<String>,

    /// Overwrite an existing verified-email attribute.
    #[serde(default)]
    pub replace: bool,

    /// Enable per-address scope/domain verification for IdPs not in the
    /// include list.
    #[serde(default)]
    pub scope_checking: bool,

    /// Attribute holding the user's home-organization domain, used as a
    /// secondary verification signal. Expected single-valued.
    #[serde(default = "default_home_organization_attribute")]
    pub home_organization_attribute: String,
}

fn default_email_attribute() -> String {
    "mail".to_string()
}

fn default_verified_email_attribute() -> String {
    "voPersonVerifiedEmail".to_string()
}

fn default_home_organization_attribute() -> String {
    "schacHomeOrganization".to_string()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            email_attribute: default_email_attribute(),
            verified_email_attribute: default_verified_email_attribute(),
            idp_entity_id_include_list: Vec::new(),
            replace: false,
            scope_checking: false,
            home_organization_attribute: default_home_organization_attribute(),
        }
    }
}

impl FilterConfig {
    /// Build a configuration from an untyped option mapping.
    ///
    /// Each option's shape is checked once here; a wrong type or unknown
    /// key fails with an error naming the offending option, so a
    /// misconfigured filter is rejected before any event is processed.
    pub fn from_value(value: Value) -> Result<Self> {
        let map = value
            .as_object()
            .context("filter configuration is not an object")?;

        let mut config = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "emailAttribute" => config.email_attribute = string_option(key, value)?,
                "verifiedEmailAttribute" => {
                    config.verified_email_attribute = string_option(key, value)?;
                }
                "idpEntityIdIncludeList" => {
                    config.idp_entity_id_include_list = string_list_option(key, value)?;
                }
                "replace" => config.replace = bool_option(key, value)?,
                "scopeChecking" => config.scope_checking = bool_option(key, value)?,
                "homeOrganizationAttribute" => {
                    config.home_organization_attribute = string_option(key, value)?;
                }
                _ => return Err(anyhow!("unknown filter option '{key}'")),
            }
        }

        config.validate().map_err(|e| anyhow!(e))?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.email_attribute.is_empty() {
            return Err("emailAttribute must not be empty".to_string());
        }
        if self.verified_email_attribute.is_empty() {
            return Err("verifiedEmailAttribute must not be empty".to_string());
        }
        if self.home_organization_attribute.is_empty() {
            return Err("homeOrganizationAttribute must not be empty".to_string());
        }
        Ok(())
    }

    /// Whether an IdP is in the include list.
    pub fn trusts_idp(&self, entity_id: &str) -> bool {
        self.idp_entity_id_include_list
            .iter()
            .any(|id| id == entity_id)
    }
}

fn string_option(key: &str, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("filter option '{key}' is not a string"))
}

fn bool_option(key: &str, value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| anyhow!("filter option '{key}' is not a boolean"))
}

fn string_list_option(key: &str, value: &Value) -> Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| anyhow!("filter option '{key}' is not a list"))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| anyhow!("filter option '{key}' is not a list of strings"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = FilterConfig::default();
        assert_eq!(config.email_attribute, "mail");
        assert_eq!(config.verified_email_attribute, "voPersonVerifiedEmail");
        assert_eq!(config.home_organization_attribute, "schacHomeOrganization");
        assert!(config.idp_entity_id_include_list.is_empty());
        assert!(!config.replace);
        assert!(!config.scope_checking);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_value_full() {
        let config = FilterConfig::from_value(json!({
            "emailAttribute": "email",
            "verifiedEmailAttribute": "verifiedEmail",
            "idpEntityIdIncludeList": ["https://idp.example.org"],
            "replace": true,
            "scopeChecking": true,
            "homeOrganizationAttribute": "o",
        }))
        .unwrap();

        assert_eq!(config.email_attribute, "email");
        assert_eq!(config.verified_email_attribute, "verifiedEmail");
        assert!(config.trusts_idp("https://idp.example.org"));
        assert!(!config.trusts_idp("https://other.example.org"));
        assert!(config.replace);
        assert!(config.scope_checking);
        assert_eq!(config.home_organization_attribute, "o");
    }

    #[test]
    fn test_from_value_defaults_apply() {
        let config = FilterConfig::from_value(json!({})).unwrap();
        assert_eq!(config.email_attribute, "mail");
        assert!(!config.scope_checking);
    }

    #[test]
    fn test_from_value_wrong_shapes() {
        let err = FilterConfig::from_value(json!({ "emailAttribute": 42 })).unwrap_err();
        assert!(err.to_string().contains("emailAttribute"));

        let err = FilterConfig::from_value(json!({ "replace": "yes" })).unwrap_err();
        assert!(err.to_string().contains("replace"));

        let err = FilterConfig::from_value(json!({ "scopeChecking": 1 })).unwrap_err();
        assert!(err.to_string().contains("scopeChecking"));

        let err =
            FilterConfig::from_value(json!({ "idpEntityIdIncludeList": "not-a-list" }))
                .unwrap_err();
        assert!(err.to_string().contains("idpEntityIdIncludeList"));

        let err =
            FilterConfig::from_value(json!({ "idpEntityIdIncludeList": [1, 2] })).unwrap_err();
        assert!(err.to_string().contains("idpEntityIdIncludeList"));

        let err = FilterConfig::from_value(json!([])).unwrap_err();
        assert!(err.to_string().contains("not an object"));
    }

    #[test]
    fn test_from_value_unknown_option() {
        let err = FilterConfig::from_value(json!({ "emailAtribute": "mail" })).unwrap_err();
        assert!(err.to_string().contains("emailAtribute"));
    }

    #[test]
    fn test_validation_rejects_empty_names() {
        let err = FilterConfig::from_value(json!({ "emailAttribute": "" })).unwrap_err();
        assert!(err.to_string().contains("emailAttribute"));

        let mut config = FilterConfig::default();
        config.verified_email_attribute = String::new();
        assert!(config.validate().is_err());
    }
}
