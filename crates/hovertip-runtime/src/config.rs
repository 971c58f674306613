#![forbid(unsafe_code)]

//! Tooltip timing and suppression configuration.
//!
//! [`TooltipConfig`] is the in-memory form every [`Coordinator`] is built
//! from. With the `policy-config` feature a [`TooltipPolicy`] can be loaded
//! from TOML or JSON and converted after validation:
//!
//! ```toml
//! # hovertip.toml
//! rest_delay_ms = 150
//! linger_delay_ms = 400
//! suppress_focus = false
//! ```
//!
//! ```rust,ignore
//! let config = TooltipPolicy::from_toml_file("hovertip.toml")?.into_config()?;
//! ```
//!
//! Missing keys keep their defaults.
//!
//! [`Coordinator`]: crate::coordinator::Coordinator

#[cfg(feature = "policy-config")]
use std::path::Path;
use std::time::Duration;

#[cfg(feature = "policy-config")]
use serde::{Deserialize, Serialize};

/// Environment variable that turns on the focus suppression switch.
pub const DISABLE_ENV_VAR: &str = "HOVERTIP_DISABLE_TOOLTIPS";

/// Default pause before a hovered trigger shows its tooltip.
pub const DEFAULT_REST_DELAY: Duration = Duration::from_millis(100);

/// Default grace period before a left tooltip hides.
pub const DEFAULT_LINGER_DELAY: Duration = Duration::from_millis(500);

/// Longest delay a policy file may request.
pub const MAX_DELAY: Duration = Duration::from_secs(60);

/// Coordinator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TooltipConfig {
    /// Pointer rest time before showing (default: 100ms).
    pub rest_delay: Duration,
    /// Grace period after leaving before hiding (default: 500ms).
    pub linger_delay: Duration,
    /// Initial value of the focus suppression switch (default: false).
    pub suppress_focus: bool,
}

impl Default for TooltipConfig {
    fn default() -> Self {
        Self {
            rest_delay: DEFAULT_REST_DELAY,
            linger_delay: DEFAULT_LINGER_DELAY,
            suppress_focus: false,
        }
    }
}

impl TooltipConfig {
    /// Defaults, with [`DISABLE_ENV_VAR`] applied.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides read through `lookup`.
    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup(DISABLE_ENV_VAR) {
            self.suppress_focus = value == "1" || value.eq_ignore_ascii_case("true");
        }
        self
    }

    /// Set the rest delay.
    #[must_use]
    pub fn rest_delay(mut self, delay: Duration) -> Self {
        self.rest_delay = delay;
        self
    }

    /// Set the linger delay.
    #[must_use]
    pub fn linger_delay(mut self, delay: Duration) -> Self {
        self.linger_delay = delay;
        self
    }

    /// Set the initial focus suppression switch.
    #[must_use]
    pub fn suppress_focus(mut self, suppress: bool) -> Self {
        self.suppress_focus = suppress;
        self
    }
}

/// Serializable policy form of [`TooltipConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "policy-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct TooltipPolicy {
    /// Rest delay in milliseconds. Default: 100.
    pub rest_delay_ms: u64,
    /// Linger delay in milliseconds. Default: 500.
    pub linger_delay_ms: u64,
    /// Suppress focus-driven display. Default: false.
    pub suppress_focus: bool,
}

impl Default for TooltipPolicy {
    fn default() -> Self {
        let config = TooltipConfig::default();
        Self {
            rest_delay_ms: config.rest_delay.as_millis() as u64,
            linger_delay_ms: config.linger_delay.as_millis() as u64,
            suppress_focus: config.suppress_focus,
        }
    }
}

impl TooltipPolicy {
    /// Load from a TOML string.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "policy-config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "policy-config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters.
    ///
    /// Returns a list of validation errors. An empty list means the policy
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let max_ms = MAX_DELAY.as_millis() as u64;

        if self.rest_delay_ms > max_ms {
            errors.push(format!(
                "rest_delay_ms must be <= {max_ms}, got {}",
                self.rest_delay_ms
            ));
        }
        if self.linger_delay_ms > max_ms {
            errors.push(format!(
                "linger_delay_ms must be <= {max_ms}, got {}",
                self.linger_delay_ms
            ));
        }

        errors
    }

    /// Validate and convert to a [`TooltipConfig`].
    pub fn into_config(self) -> Result<TooltipConfig, ConfigError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }
        Ok(TooltipConfig {
            rest_delay: Duration::from_millis(self.rest_delay_ms),
            linger_delay: Duration::from_millis(self.linger_delay_ms),
            suppress_focus: self.suppress_focus,
        })
    }
}

/// Errors that can occur when loading a tooltip policy.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "policy-config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "policy-config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "policy-config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "policy-config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "policy-config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "policy-config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
