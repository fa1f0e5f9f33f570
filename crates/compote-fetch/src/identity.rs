//! Storage identity for components served by a particular registry.

use std::fmt;

use sha2::{Digest, Sha256};
use url::Url;

/// Lowercase hex SHA-256 of a normalized registry endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Derive the key for `endpoint`.
    ///
    /// The endpoint is normalized to `netloc/segment/segment` before hashing,
    /// so trailing slashes and empty path segments do not change the key.
    pub fn derive(endpoint: &Url) -> Self {
        let path = endpoint
            .path()
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        let normalized = format!("{}/{}", netloc(endpoint), path);

        Self(hex::encode(Sha256::digest(normalized.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `[user[:password]@]host[:port]`
fn netloc(url: &Url) -> String {
    let mut netloc = String::new();

    if !url.username().is_empty() {
        netloc.push_str(url.username());
        if let Some(password) = url.password() {
            netloc.push(':');
            netloc.push_str(password);
        }
        netloc.push('@');
    }
    if let Some(host) = url.host_str() {
        netloc.push_str(host);
    }
    if let Some(port) = url.port() {
        netloc.push(':');
        netloc.push_str(&port.to_string());
    }

    netloc
}

/// Filesystem-safe token naming one component version from one registry.
///
/// `/` in `name` becomes `~~`, then name, version and key are joined with `~`.
pub fn unique_token(name: &str, version: &str, key: &IdentityKey) -> String {
    [name.replace('/', "~~").as_str(), version, key.as_str()].join("~")
}
