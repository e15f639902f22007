//! Record types.
//!
//! A manager stores anything that implements [`Record`]: the only thing it
//! ever looks at is the record name, everything else is payload that is moved
//! around as a unit.
//!
//! The [`Cookie`] struct is the default record. It can be (de)serialized via
//! `serde` so a collaborator can dump or inspect a snapshot.
//!
//! ```rust,no_run
//! use cookie_manager::cookies::Cookie;
//!
//! let c = Cookie {
//!     name: "session".into(),
//!     value: "abc123".into(),
//!     path: Some("/".into()),
//!     domain: Some("example.com".into()),
//!     secure: true,
//!     expires: Some("2025-12-31T23:59:59Z".into()),
//!     same_site: Some("Lax".into()),
//!     http_only: true,
//! };
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A value that can be kept in a manager collection.
///
/// Two records with the same [`name`](Record::name) are the same entry: storing
/// the second one replaces the first at its position.
pub trait Record: Send + Sync + 'static {
    /// Unique key of this record within a collection (case-sensitive).
    fn name(&self) -> &str;
}

impl<R: Record + ?Sized> Record for Arc<R> {
    fn name(&self) -> &str {
        (**self).name()
    }
}

/// A cookie as handed over by the HTTP layer.
///
/// Apart from `name`, the manager treats every field as opaque. Expiration,
/// domain and path are carried but never acted upon.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name (case-sensitive).
    pub name: String,

    /// Raw cookie value (not URL-decoded).
    pub value: String,

    /// Path scoping as received (e.g., `"/"`).
    pub path: Option<String>,

    /// Domain scoping as received, leading dot stripped.
    pub domain: Option<String>,

    /// `Secure` attribute.
    pub secure: bool,

    /// Raw `Expires` attribute. Session cookies have `None`.
    pub expires: Option<String>,

    /// SameSite policy (`"Strict"`, `"Lax"`, `"None"`, or whatever the server sent).
    pub same_site: Option<String>,

    /// `HttpOnly` attribute.
    pub http_only: bool,
}

impl Cookie {
    /// Creates a plain `name=value` cookie without attributes.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    /// Returns the `name=value` pair as sent in a `Cookie` request header.
    pub fn pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

impl Record for Cookie {
    fn name(&self) -> &str {
        &self.name
    }
}
