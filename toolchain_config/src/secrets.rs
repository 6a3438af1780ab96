use std::{collections::HashMap, fmt};

use serde::{Serialize, Serializer};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::ConfigError;

pub const INFURA_API_KEY_ENV_VAR: &str = "INFURA_API_KEY";
pub const SEPOLIA_PRIVATE_KEY_ENV_VAR: &str = "SEPOLIA_PRIVATE_KEY";

pub const REDACTED: &str = "<redacted>";

/// A value that must not end up in logs, debug output or committed files.
///
/// The raw string is only reachable through [`Secret::expose`]. Memory is cleared on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl Eq for Secret {}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

/// Where configuration variables are looked up.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Variables from `primary` win, `fallback` fills the gaps.
pub struct Layered<A, B> {
    pub primary: A,
    pub fallback: B,
}

impl<A: EnvSource, B: EnvSource> EnvSource for Layered<A, B> {
    fn var(&self, name: &str) -> Option<String> {
        self.primary.var(name).or_else(|| self.fallback.var(name))
    }
}

/// Optional, non-secret variable. Blank counts as unset.
pub fn optional(source: &impl EnvSource, name: &str) -> Option<String> {
    let mut raw = source.var(name)?;
    let value = raw.trim().to_owned();
    raw.zeroize();
    (!value.is_empty()).then_some(value)
}

/// Look up a secret, failing if it is unset or blank.
pub fn require(source: &impl EnvSource, name: &'static str) -> Result<Secret, ConfigError> {
    optional(source, name)
        .map(Secret::new)
        .ok_or(ConfigError::MissingVar(name))
}
