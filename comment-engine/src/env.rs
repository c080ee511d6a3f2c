//! Environment snapshot and secret censoring.
//!
//! The environment is captured once per invocation from a flat list of
//! `KEY=VALUE` strings and censored in place before any template can see it.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::errors::{EngineError, EngineResult};

/// Fixed mask written over every censored value.
pub const CENSOR_MASK: &str = "********";

/// Credential, token and keyfile variables that are always censored.
const BUILTIN_SENSITIVE_KEYS: &[&str] = &[
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "CIRCLECI_API_TOKEN",
    "CIRCLE_TOKEN",
    "CODECOV_TOKEN",
    "COVERALLS_REPO_TOKEN",
    "DOCKER_PASSWORD",
    "GCLOUD_SERVICE_KEY",
    "GH_TOKEN",
    "GITHUB_TOKEN",
    "GOOGLE_APPLICATION_CREDENTIALS",
    "GOOGLE_CLOUD_KEYFILE_JSON",
    "NPM_TOKEN",
];

/// Variable names whose values must never reach a rendered comment.
///
/// An immutable value handed to the context builder; `default()` holds the
/// built-in list and [`SensitiveKeys::with_extra`] extends it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensitiveKeys {
    keys: BTreeSet<String>,
}

impl SensitiveKeys {
    /// A set holding exactly `keys`, without the built-in list.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// The built-in list plus `extra`.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        set.keys.extend(extra.into_iter().map(Into::into));
        set
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

impl Default for SensitiveKeys {
    fn default() -> Self {
        Self::new(BUILTIN_SENSITIVE_KEYS.iter().copied())
    }
}

/// Mapping from variable name to value; keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Builds an environment from `KEY=VALUE` entries, splitting each on the
    /// first `=`. When a key repeats, the last occurrence wins.
    ///
    /// An entry without `=` fails the whole build with
    /// [`EngineError::MalformedEnvironmentEntry`].
    pub fn from_entries<I, S>(entries: I) -> EngineResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vars = BTreeMap::new();
        for entry in entries {
            let entry = entry.as_ref();
            let Some((name, value)) = entry.split_once('=') else {
                return Err(EngineError::MalformedEnvironmentEntry {
                    entry: entry.to_string(),
                });
            };
            vars.insert(name.to_string(), value.to_string());
        }
        debug!(vars = vars.len(), "environment snapshot built");
        Ok(Self { vars })
    }

    /// Looks up `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Looks up `key`, falling back to `fallback` when it is absent.
    ///
    /// A present but empty value is returned as-is.
    pub fn get_or<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.get(key).unwrap_or(fallback)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replaces, in place, the value of every key present in both the
    /// environment and `sensitive` with [`CENSOR_MASK`]. Returns how many
    /// values were masked.
    pub fn censor(&mut self, sensitive: &SensitiveKeys) -> usize {
        let mut masked = 0;
        for key in sensitive.iter() {
            if let Some(value) = self.vars.get_mut(key) {
                *value = CENSOR_MASK.to_string();
                masked += 1;
            }
        }
        debug!(masked, "environment censored");
        masked
    }
}
