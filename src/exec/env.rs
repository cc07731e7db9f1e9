//! Host environment snapshot and per-command overlays.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Process environment and working directory, captured once at start.
///
/// Every command's environment is derived from this snapshot, never from
/// the live process state.
/// Names and values are kept as raw OS strings, so variables that are not
/// valid UTF-8 still reach child processes unchanged.
#[derive(Debug, Clone, Default)]
pub struct HostEnv {
    vars: BTreeMap<OsString, OsString>,
    cwd: PathBuf,
}

impl HostEnv {
    /// Captures the current process environment and working directory.
    pub fn capture() -> std::io::Result<Self> {
        let cwd = std::env::current_dir()?;
        let vars = std::env::vars_os().collect();

        Ok(Self { vars, cwd })
    }

    /// Builds a snapshot from explicit parts
    pub fn new<K, V>(vars: impl IntoIterator<Item = (K, V)>, cwd: impl Into<PathBuf>) -> Self
    where
        K: Into<OsString>,
        V: Into<OsString>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
            cwd: cwd.into(),
        }
    }

    /// Value of a host variable, if it is valid UTF-8
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(OsStr::new(key)).and_then(|value| value.to_str())
    }

    /// Working directory at start
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Host variables with the overlay applied on top; the overlay wins.
    pub fn merged_with(&self, overlay: &EnvOverlay) -> BTreeMap<OsString, OsString> {
        let mut merged = self.vars.clone();
        for (key, value) in overlay.iter() {
            merged.insert(key.into(), value.into());
        }
        merged
    }
}

/// Variables layered over the host environment for one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverlay {
    vars: BTreeMap<String, String>,
}

impl EnvOverlay {
    /// Empty overlay
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a variable, replacing an earlier value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Builder form of [`EnvOverlay::set`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Value of a variable in the overlay
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Iterates over the overlay in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether the overlay sets nothing
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Number of variables set
    pub fn len(&self) -> usize {
        self.vars.len()
    }
}
