//! Credentials and protocol version for a target.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A string that must not be revealed when the configuration is written back out.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The secret value itself.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.0 = value.into();
    }
}

impl Serialize for Secret {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if self.0.is_empty() {
            serializer.serialize_str("")
        } else {
            serializer.serialize_str("<secret>")
        }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Secret(\"\")")
        } else {
            f.write_str("Secret(<secret>)")
        }
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// SNMPv3 security level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SecurityLevel {
    #[default]
    #[serde(rename = "noAuthNoPriv")]
    NoAuthNoPriv,
    #[serde(rename = "authNoPriv")]
    AuthNoPriv,
    #[serde(rename = "authPriv")]
    AuthPriv,
}

/// SNMPv3 authentication protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthProtocol {
    #[default]
    Md5,
    Sha,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

/// SNMPv3 privacy protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrivProtocol {
    #[default]
    Des,
    Aes,
    Aes192,
    #[serde(rename = "AES192C")]
    Aes192C,
    Aes256,
    #[serde(rename = "AES256C")]
    Aes256C,
}

/// Authentication settings for a target.
///
/// Only `version` matters to the scrape logic: it picks walk semantics and
/// the per-request OID cap. Everything else is handed to the scraper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Auth {
    #[serde(skip_serializing_if = "Secret::is_empty")]
    pub community: Secret,
    pub security_level: SecurityLevel,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(skip_serializing_if = "Secret::is_empty")]
    pub password: Secret,
    pub auth_protocol: AuthProtocol,
    pub priv_protocol: PrivProtocol,
    #[serde(skip_serializing_if = "Secret::is_empty")]
    pub priv_password: Secret,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub context_name: String,
    pub version: u8,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            community: Secret::new("public"),
            security_level: SecurityLevel::NoAuthNoPriv,
            username: String::new(),
            password: Secret::default(),
            auth_protocol: AuthProtocol::Md5,
            priv_protocol: PrivProtocol::Des,
            priv_password: Secret::default(),
            context_name: String::new(),
            version: 2,
        }
    }
}

impl Auth {
    /// Check the version and, for v3, that the chosen security level has
    /// everything it needs.
    pub fn validate(&self) -> Result<()> {
        if !(1..=3).contains(&self.version) {
            return Err(Error::config(format!(
                "SNMP version must be 1, 2 or 3. Got: {}",
                self.version
            )));
        }
        if self.version != 3 {
            return Ok(());
        }

        if self.security_level == SecurityLevel::AuthPriv && self.priv_password.is_empty() {
            return Err(Error::config(
                "priv password is missing, required for SNMPv3 with priv",
            ));
        }
        if matches!(
            self.security_level,
            SecurityLevel::AuthPriv | SecurityLevel::AuthNoPriv
        ) && self.password.is_empty()
        {
            return Err(Error::config(
                "auth password is missing, required for SNMPv3 with auth",
            ));
        }
        if self.username.is_empty() {
            return Err(Error::config("auth username is missing, required for SNMPv3"));
        }
        Ok(())
    }
}

/// Expand `$VAR` and `${VAR}` references from the process environment.
///
/// Unset variables expand to nothing. A value that expands to the empty
/// string is an error, since it almost always means a missing variable.
pub(crate) fn substitute_env(value: &str) -> Result<String> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        if name.is_empty() {
            // Not a reference; keep the '$' as written.
            out.push('$');
            rest = after;
            continue;
        }

        if let Ok(v) = std::env::var(name) {
            out.push_str(&v);
        }
        rest = &after[consumed..];
    }
    out.push_str(rest);

    if out.is_empty() {
        return Err(Error::config(format!(
            "{value} environment variable not found"
        )));
    }
    Ok(out)
}
