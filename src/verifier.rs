//! Verified-email decision logic.

use anyhow::{anyhow, Result};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::FilterConfig;
use crate::record::AttributeRecord;
use crate::ProcessingFilter;

/// Processing filter that derives a verified-email attribute.
///
/// Two ways an address becomes verified: the authenticating IdP is in the
/// configured include list (every email value is asserted verified), or
/// scope checking is enabled and the address's domain matches the IdP's
/// declared scopes, its default SSO endpoint host, or the user's
/// home-organization domain.
#[derive(Debug, Clone)]
pub struct EmailVerifier {
    config: FilterConfig,
}

impl EmailVerifier {
    /// Create the filter, rejecting an invalid configuration.
    pub fn new(config: FilterConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow!("verified-email filter configuration error: {e}"))?;
        Ok(Self { config })
    }

    /// The filter's configuration.
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Apply the filter to one authentication event.
    ///
    /// Mutates the record in place on success; every declining branch
    /// leaves the record untouched. Never fails the login.
    pub fn process(&self, record: &mut AttributeRecord) {
        let config = &self.config;

        // Nothing to do if the email attribute is missing.
        let emails = match record.values(&config.email_attribute) {
            Some(values) if !values.is_empty() => values.to_vec(),
            _ => {
                debug!(
                    attribute = %config.email_attribute,
                    "cannot generate verified email: email attribute is missing"
                );
                return;
            }
        };

        // Nothing to do if the destination already exists and replace is off.
        if record.has_non_empty(&config.verified_email_attribute) && !config.replace {
            debug!(
                attribute = %config.verified_email_attribute,
                "attribute already present and replace is disabled"
            );
            return;
        }

        // A well-formed record always carries an IdP entity ID; log and
        // decline if it does not.
        let idp_entity_id = match record.idp_entity_id() {
            Some(id) => id.to_string(),
            None => {
                error!("failed to resolve IdP entity ID from record");
                return;
            }
        };

        // Trusted-provider fast path: assert every email value as verified.
        if config.trusts_idp(&idp_entity_id) {
            debug!(
                idp = %idp_entity_id,
                "IdP in include list, asserting all email values as verified"
            );
            let count = emails.len();
            record.set_values(&config.verified_email_attribute, emails);
            info!(
                attribute = %config.verified_email_attribute,
                idp = %idp_entity_id,
                count,
                "added verified email attribute"
            );
            return;
        }

        if config.scope_checking {
            let verified: Vec<String> = emails
                .iter()
                .filter(|address| self.verify_address(address, record))
                .cloned()
                .collect();

            if verified.is_empty() {
                debug!(
                    idp = %idp_entity_id,
                    "no email address passed scope verification"
                );
                return;
            }

            info!(
                attribute = %config.verified_email_attribute,
                idp = %idp_entity_id,
                count = verified.len(),
                "added verified email attribute"
            );
            record.set_values(&config.verified_email_attribute, verified);
            return;
        }

        debug!(
            idp = %idp_entity_id,
            attribute = %config.verified_email_attribute,
            "will not generate attribute: IdP not in include list"
        );
    }

    /// Decide whether a single address is verifiable against the IdP's
    /// declared scopes, its default SSO endpoint host, or the user's
    /// home-organization domain.
    fn verify_address(&self, address: &str, record: &AttributeRecord) -> bool {
        let domain = match email_domain(address) {
            Some(d) => d,
            None => {
                debug!(%address, "address has no domain part, treating as unverifiable");
                return false;
            }
        };

        let scopes = &record.source.scopes;
        if let Some(scope) = scopes.iter().find(|s| domain_ends_with(domain, s)) {
            debug!(%domain, %scope, "domain matches an IdP scope");
            return true;
        }

        if let Some(host) = record.source.default_sso_location().and_then(endpoint_host) {
            if domain_ends_with(domain, &host) {
                debug!(%domain, %host, "domain matches default SSO endpoint host");
                return true;
            }
        }

        // Home-organization matching is only trusted for IdPs that declare
        // scopes at all.
        if !scopes.is_empty() {
            if let Some(values) = record.values(&self.config.home_organization_attribute) {
                if values.len() > 1 {
                    warn!(
                        attribute = %self.config.home_organization_attribute,
                        count = values.len(),
                        "expected single-valued attribute, skipping home-organization match"
                    );
                } else if let Some(organization) = values.first() {
                    if domain_ends_with(domain, organization) {
                        debug!(%domain, %organization, "domain matches home organization");
                        return true;
                    }
                }
            }
        }

        false
    }
}

impl ProcessingFilter for EmailVerifier {
    fn process(&self, record: &mut AttributeRecord) {
        EmailVerifier::process(self, record);
    }
}

/// Domain part of an email address: everything after the last `@`.
fn email_domain(address: &str) -> Option<&str> {
    match address.rsplit_once('@') {
        Some((_, domain)) if !domain.is_empty() => Some(domain),
        _ => None,
    }
}

/// Host component of an endpoint location URL.
fn endpoint_host(location: &str) -> Option<String> {
    match Url::parse(location) {
        Ok(url) => url.host_str().map(str::to_string),
        Err(e) => {
            debug!(%location, error = %e, "failed to parse SSO endpoint location");
            None
        }
    }
}

/// Whether `candidate` equals `suffix` or is a sub-domain of it.
///
/// Label-aligned: `sub.example.org` matches `example.org`, but
/// `notexample.org` does not. Comparison is ASCII-case-insensitive, since
/// DNS names are case-insensitive.
pub fn domain_ends_with(candidate: &str, suffix: &str) -> bool {
    if suffix.is_empty() {
        return false;
    }
    let candidate = candidate.to_ascii_lowercase();
    let suffix = suffix.to_ascii_lowercase();
    candidate == suffix
        || candidate
            .strip_suffix(&suffix)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
