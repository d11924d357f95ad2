//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream instance by its base URI
//! - Resolve request paths against that base, never outside it

use std::fmt;

use thiserror::Error;
use url::Url;

/// Why a request path cannot be forwarded to a backend.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Parse(#[from] url::ParseError),

    #[error("'{0}' resolves outside the backend base")]
    OutsideBase(String),
}

/// A single backend server, identified by its base URI.
///
/// The base is normalised to end with `/` so that request paths resolve
/// underneath it: `http://b:9000/api` + `/v1/x` becomes
/// `http://b:9000/api/v1/x`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Backend {
    base_url: Url,
}

impl Backend {
    /// Parse a backend from its configured base URI.
    pub fn parse(address: &str) -> Result<Self, url::ParseError> {
        let mut base_url = Url::parse(address.trim())?;
        if base_url.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        base_url.set_query(None);
        base_url.set_fragment(None);
        Ok(Self { base_url })
    }

    /// The normalised base URI.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a request path (optionally with a query string) against this backend.
    ///
    /// The result always keeps this backend's scheme, credentials, host and
    /// port, and stays under its base path. Paths that would leave it, such
    /// as `/http://other/x` or `/../x` under a prefixed base, are rejected.
    pub fn resolve(&self, path: &str) -> Result<Url, ResolveError> {
        let url = self.base_url.join(path.trim_start_matches('/'))?;
        let base = &self.base_url;

        let same_origin = url.scheme() == base.scheme()
            && url.username() == base.username()
            && url.password() == base.password()
            && url.host() == base.host()
            && url.port_or_known_default() == base.port_or_known_default();

        if !same_origin || !url.path().starts_with(base.path()) {
            return Err(ResolveError::OutsideBase(path.to_string()));
        }
        Ok(url)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base_url.as_str().trim_end_matches('/'))
    }
}
