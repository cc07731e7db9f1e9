//! Exclude filter over `os/arch` platform ids.

use regex::Regex;

use super::PlatformDescriptor;
use crate::error::ConfigError;

/// Decides which platforms are skipped.
///
/// The pattern is compiled once, so an invalid pattern is reported before
/// any platform is dispatched. Matching is unanchored: `arm` also skips
/// `linux/arm64`.
#[derive(Debug, Clone, Default)]
pub struct SkipFilter {
    pattern: Option<Regex>,
}

impl SkipFilter {
    /// Compiles an exclude pattern. An empty pattern never skips.
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        if pattern.is_empty() {
            return Ok(Self::default());
        }

        let regex = Regex::new(pattern).map_err(|source| ConfigError::InvalidExcludePattern {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            pattern: Some(regex),
        })
    }

    /// Whether the platform matches the exclude pattern
    pub fn should_skip(&self, platform: &PlatformDescriptor) -> bool {
        self.matches(&platform.id())
    }

    /// Whether an `os/arch` id matches the exclude pattern
    pub fn matches(&self, id: &str) -> bool {
        self.pattern.as_ref().is_some_and(|regex| regex.is_match(id))
    }
}
