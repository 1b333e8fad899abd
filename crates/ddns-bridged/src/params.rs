//! Request parameter decoding
//!
//! Routers disagree on parameter names. Everything a client sends (query
//! string, form body, HTTP Basic credentials) is folded onto the canonical
//! field set of [`RawUpdateRequest`] here.

use base64::{Engine, engine::general_purpose::STANDARD};
use ddns_bridge_core::{RawUpdateRequest, split_domains};
use std::collections::HashMap;
use std::fmt;

/// Canonical key and its accepted aliases, in lookup order
const ALIASES: &[(&str, &[&str])] = &[
    ("user", &["username", "user", "usr", "login", "sysuser"]),
    ("password", &["password", "pass", "passwd", "pwd", "pw"]),
    (
        "domain",
        &["domain", "hostname", "host", "name", "system", "host-name"],
    ),
    ("ipv4", &["ipv4", "ip", "myip", "ipv4addr"]),
    ("ipv6", &["ipv6", "myipv6", "ipv6addr"]),
    ("mode", &["mode"]),
    ("force", &["force", "all", "updateall"]),
];

/// Parameters carrying the domain list, first non-empty wins
const DOMAIN_LIST_KEYS: &[&str] = &["domain", "hostname", "host", "name", "system"];

/// Decode one `application/x-www-form-urlencoded` component
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

/// Split `a=1&b=2` into decoded pairs, keeping order
pub fn parse_urlencoded(input: &str) -> Vec<(String, String)> {
    input
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once('=') {
            Some((key, value)) => (decode_component(key), decode_component(value)),
            None => (decode_component(part), String::new()),
        })
        .collect()
}

/// `1`, `true`, `yes` and `on` (any case) are true, everything else false
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Credentials from an `Authorization: Basic ...` header
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub user: String,
    pub password: String,
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("user", &self.user)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

impl BasicCredentials {
    /// Parse an `Authorization` header value
    ///
    /// Returns `None` for other schemes and undecodable payloads. A payload
    /// without `:` is taken as a bare user name.
    pub fn from_header(header: &str) -> Option<Self> {
        let scheme = header.get(..6)?;
        if !scheme.eq_ignore_ascii_case("basic ") {
            return None;
        }

        let decoded = STANDARD.decode(header[6..].trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;

        let (user, password) = decoded.split_once(':').unwrap_or((decoded.as_str(), ""));
        Some(Self {
            user: user.to_string(),
            password: password.to_string(),
        })
    }
}

/// All parameters of one HTTP request
///
/// Form body values override query values with the same name.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    values: HashMap<String, String>,
}

impl RequestParams {
    /// Merge a query string and an optional form body
    pub fn from_parts(query: Option<&str>, form_body: Option<&str>) -> Self {
        let mut values = HashMap::new();
        for source in [query, form_body].into_iter().flatten() {
            values.extend(parse_urlencoded(source));
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Comma-separated domains of this request
    ///
    /// Taken from the first of `domain`, `hostname`, `host`, `name`,
    /// `system` that is not blank, then split, trimmed and stripped of
    /// empty entries.
    pub fn domain_list(&self) -> Vec<String> {
        DOMAIN_LIST_KEYS
            .iter()
            .filter_map(|key| self.get(key))
            .find(|value| !value.trim().is_empty())
            .map(split_domains)
            .unwrap_or_default()
    }

    /// Fold aliases onto the canonical request fields
    ///
    /// A canonical key always wins over its aliases; otherwise the first
    /// alias present is used. Separate `hostname` and `domain` parameters
    /// are joined into `hostname.domain` when no domain resolved. Basic
    /// credentials only fill a user or password that is still empty.
    pub fn normalize(&self, basic: Option<&BasicCredentials>) -> RawUpdateRequest {
        let mut fields: HashMap<&str, String> = HashMap::new();

        for &(canonical, aliases) in ALIASES {
            let value = self
                .get(canonical)
                .or_else(|| aliases.iter().find_map(|alias| self.get(alias)));
            if let Some(value) = value {
                fields.insert(canonical, value.to_string());
            }
        }

        if let (Some(host), Some(domain)) = (self.get("hostname"), self.get("domain"))
            && fields.get("domain").is_none_or(|d| d.is_empty())
        {
            let combined = format!(
                "{}.{}",
                host.trim_end_matches('.'),
                domain.trim_start_matches('.')
            );
            fields.insert("domain", combined);
        }

        for value in fields.values_mut() {
            *value = value.trim().to_string();
        }

        let mut request = RawUpdateRequest {
            user: fields.remove("user"),
            password: fields.remove("password"),
            domain: fields.remove("domain"),
            mode: fields.remove("mode"),
            ipv4: fields.remove("ipv4"),
            ipv6: fields.remove("ipv6"),
            force: fields.remove("force").is_some_and(|f| is_truthy(&f)),
        };

        if let Some(basic) = basic {
            if request.user.as_deref().is_none_or(str::is_empty) && !basic.user.is_empty() {
                request.user = Some(basic.user.clone());
            }
            if request.password.as_deref().is_none_or(str::is_empty) && !basic.password.is_empty()
            {
                request.password = Some(basic.password.clone());
            }
        }

        request
    }
}
