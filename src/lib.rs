//! Verified-email attribute filter.
//!
//! A post-authentication processing filter for federated-identity (SAML)
//! pipelines. Given the attributes released for a login and metadata about
//! the identity provider that authenticated the user, it conditionally
//! derives a verified-email attribute from an existing email attribute:
//! either the IdP is explicitly trusted to assert verified addresses, or
//! each address is checked against the email domains the IdP declares as
//! its own.
//!
//! The filter is a pure in-memory transformation invoked once per login.
//! It performs no I/O and holds no state beyond its immutable
//! [`FilterConfig`]; the pipeline owns the [`AttributeRecord`] and passes
//! it in by mutable reference.

pub mod config;
pub mod record;
pub mod verifier;

pub use config::FilterConfig;
pub use record::{AttributeRecord, IdpSource, SsoEndpoint};
pub use verifier::{domain_ends_with, EmailVerifier};

/// A single step in a post-authentication attribute-processing pipeline.
///
/// Filters decorate the per-event record in place. They never fail the
/// login: anomalies are logged and the record is left untouched.
pub trait ProcessingFilter {
    /// Apply this filter to the record for one authentication event.
    fn process(&self, record: &mut AttributeRecord);
}
