//! Cookie serialization and lookup.
//!
//! [`Response::set_cookie`](super::Response::set_cookie) and
//! [`Response::delete_cookie`](super::Response::delete_cookie) render `Set-Cookie`
//! values through [`Cookie`]; [`find`] reads a single cookie out of a request
//! `Cookie` header.

use chrono::{DateTime, Utc};

/// Cookie `SameSite` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    /// Attribute value as written in `Set-Cookie`.
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Caller-supplied attributes for [`Response::set_cookie`](super::Response::set_cookie).
///
/// When options are passed, `secure`, `http_only` and `same_site` are taken as given
/// (so `CookieOptions::default()` turns `HttpOnly` off). `path` and `domain` only
/// apply when non-empty, and `max_age` only when non-zero: a negative value expires
/// the cookie immediately.
///
/// # Examples
///
/// ```
/// use zapi::http::{CookieOptions, SameSite};
///
/// let opts = CookieOptions::new()
///     .path("/account")
///     .max_age(3600)
///     .secure(true)
///     .http_only(true)
///     .same_site(SameSite::Lax);
/// assert_eq!(opts.max_age, 3600);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CookieOptions {
    /// `Path` attribute; empty means `/`.
    pub path: String,
    /// `Domain` attribute; omitted when empty.
    pub domain: String,
    /// `Expires` attribute, rendered in IMF-fixdate form.
    pub expires: Option<DateTime<Utc>>,
    /// `Max-Age` in seconds; `0` omits it, negative writes `Max-Age=0`.
    pub max_age: i64,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl CookieOptions {
    /// Options with every attribute unset.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    #[must_use]
    pub fn expires(mut self, at: DateTime<Utc>) -> Self {
        self.expires = Some(at);
        self
    }

    #[must_use]
    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = seconds;
        self
    }

    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    #[must_use]
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }
}

/// A cookie about to be serialized into a `Set-Cookie` header.
#[derive(Debug, Clone)]
pub(crate) struct Cookie {
    name: String,
    value: String,
    path: String,
    domain: String,
    expires: Option<DateTime<Utc>>,
    max_age: i64,
    secure: bool,
    http_only: bool,
    same_site: Option<SameSite>,
}

impl Cookie {
    /// A cookie with the response defaults: `Path=/` and `HttpOnly`, then `opts` applied.
    pub(crate) fn new(name: &str, value: &str, opts: Option<&CookieOptions>) -> Self {
        let mut cookie = Self {
            name: name.to_owned(),
            value: value.to_owned(),
            path: "/".to_owned(),
            domain: String::new(),
            expires: None,
            max_age: 0,
            secure: false,
            http_only: true,
            same_site: None,
        };

        if let Some(opts) = opts {
            if !opts.path.is_empty() {
                cookie.path = opts.path.clone();
            }
            if !opts.domain.is_empty() {
                cookie.domain = opts.domain.clone();
            }
            if opts.expires.is_some() {
                cookie.expires = opts.expires;
            }
            if opts.max_age != 0 {
                cookie.max_age = opts.max_age;
            }
            cookie.secure = opts.secure;
            cookie.http_only = opts.http_only;
            cookie.same_site = opts.same_site;
        }

        cookie
    }

    /// A cookie that clears `name` on the client.
    pub(crate) fn removal(name: &str) -> Self {
        let mut cookie = Self::new(name, "", None);
        cookie.max_age = -1;
        cookie
    }

    /// Serialize to a `Set-Cookie` header value.
    pub(crate) fn to_header_value(&self) -> String {
        let mut parts = vec![format!("{}={}", self.name, self.value)];

        if !self.path.is_empty() {
            parts.push(format!("Path={}", self.path));
        }
        if !self.domain.is_empty() {
            parts.push(format!("Domain={}", self.domain));
        }
        if let Some(expires) = self.expires {
            parts.push(format!(
                "Expires={}",
                expires.format("%a, %d %b %Y %H:%M:%S GMT")
            ));
        }
        if self.max_age > 0 {
            parts.push(format!("Max-Age={}", self.max_age));
        } else if self.max_age < 0 {
            parts.push("Max-Age=0".to_owned());
        }
        if self.http_only {
            parts.push("HttpOnly".to_owned());
        }
        if self.secure {
            parts.push("Secure".to_owned());
        }
        if let Some(same_site) = self.same_site {
            parts.push(format!("SameSite={}", same_site.as_str()));
        }

        parts.join("; ")
    }
}

/// Finds the value of cookie `name` in a request `Cookie` header (`a=1; b=2`).
pub fn find<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
}
