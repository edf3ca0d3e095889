//! Session identity: the token and the address that carries it.
//!
//! A session is identified by a canonical UUID passed as the `uuid` query
//! parameter of the session address (`<root>/session?uuid=<token>`). The
//! token is resolved once, before anything talks to the network, and never
//! changes for the lifetime of a session runtime.

use crate::error::SessionError;
use regex::Regex;
use reqwest::Url;
use std::fmt;
use uuid::Uuid;

/// Name of the query parameter carrying the token.
pub const TOKEN_PARAM: &str = "uuid";

/// Path the backend redirects new sessions to.
pub const SESSION_PATH: &str = "/session";

/// Canonical lowercase 8-4-4-4-12 form, anchored at both ends.
const CANONICAL_UUID: &str =
    r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$";

/// Opaque session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(Uuid);

impl SessionToken {
    /// Parse a token, accepting only the canonical lowercase hyphenated form.
    ///
    /// `Uuid::parse_str` alone would also accept braced, URN and simple
    /// forms, which the backend never issues.
    pub fn parse(value: &str) -> Option<Self> {
        let canonical = Regex::new(CANONICAL_UUID).is_ok_and(|re| re.is_match(value));
        if !canonical {
            return None;
        }
        Uuid::parse_str(value).ok().map(Self)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// A resolved session address: the URL the session lives at plus its token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionAddress {
    url: Url,
    token: SessionToken,
}

impl SessionAddress {
    /// Resolve a session address, failing fatally if it carries no valid token.
    pub fn resolve(address: &str) -> Result<Self, SessionError> {
        let invalid = || SessionError::InvalidAddress {
            address: address.to_string(),
        };

        let url = Url::parse(address).map_err(|_| invalid())?;
        let token = url
            .query_pairs()
            .find(|(key, _)| key == TOKEN_PARAM)
            .and_then(|(_, value)| SessionToken::parse(&value))
            .ok_or_else(invalid)?;

        Ok(Self { url, token })
    }

    /// Build the address the backend would issue for `token` under `root`.
    pub fn for_token(root: &Url, token: SessionToken) -> Self {
        let mut url = root.clone();
        url.set_path(SESSION_PATH);
        url.set_fragment(None);
        url.query_pairs_mut()
            .clear()
            .append_pair(TOKEN_PARAM, &token.to_string());
        Self { url, token }
    }

    /// The session token.
    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// The full session URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The application root the endpoints hang off.
    pub fn root(&self) -> Url {
        application_root(&self.url)
    }
}

impl fmt::Display for SessionAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// The root (`/`) of the origin `url` belongs to.
pub fn application_root(url: &Url) -> Url {
    let mut root = url.clone();
    root.set_path("/");
    root.set_query(None);
    root.set_fragment(None);
    root
}
