#![forbid(unsafe_code)]

//! Command-line argument parsing for the demo.
//!
//! Parses args manually (no argument-parsing crate) to keep the binary lean.
//! Supports environment variable overrides via `HOVERTIP_DEMO_*` prefix.

use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use hovertip::{TooltipConfig, TooltipPolicy};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
hovertip demo: tooltip coordination on a three-button toolbar

USAGE:
    hovertip-demo [OPTIONS]

OPTIONS:
    --mode=MODE          'scripted' (default) replays a fixed interaction on
                         simulated time; 'live' runs it on wall time with a
                         background timer driver
    --policy=PATH        Load delays from a TOML or JSON policy file
    --rest-ms=N          Rest delay in milliseconds (default: 100)
    --linger-ms=N        Linger delay in milliseconds (default: 500)
    --suppress-focus     Ignore keyboard focus as a reason to show tooltips
    --log-json           Emit logs as JSON lines instead of plain text
    --help, -h           Show this help message
    --version, -V        Show version

ENVIRONMENT VARIABLES:
    HOVERTIP_DEMO_MODE          Override --mode
    HOVERTIP_DEMO_POLICY        Override --policy
    HOVERTIP_DISABLE_TOOLTIPS   Same as --suppress-focus when 1 or true
    HOVERTIP_DEBUG_TRACE        Print every transition to stderr
    RUST_LOG                    Log filter, e.g. hovertip_runtime=debug";

/// How the walkthrough advances time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Scripted,
    Live,
}

impl Mode {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "scripted" => Some(Self::Scripted),
            "live" => Some(Self::Live),
            _ => None,
        }
    }
}

/// Parsed command-line options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Opts {
    pub mode: Mode,
    /// Policy file to load before applying flag overrides.
    pub policy: Option<PathBuf>,
    pub rest_ms: Option<u64>,
    pub linger_ms: Option<u64>,
    pub suppress_focus: bool,
    pub log_json: bool,
}

impl Opts {
    /// Parse command-line arguments and environment variables.
    ///
    /// Environment variables take precedence over defaults but are overridden
    /// by explicit command-line flags.
    pub fn parse() -> Self {
        let args: Vec<String> = env::args().skip(1).collect();
        match Self::parse_from(&args, |key| env::var(key).ok()) {
            Ok(opts) => opts,
            Err(ParseOutcome::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Err(ParseOutcome::Version) => {
                println!("hovertip-demo {VERSION}");
                process::exit(0);
            }
            Err(ParseOutcome::Invalid(msg)) => {
                eprintln!("{msg}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    /// Parse `args` with environment lookups through `env`.
    pub fn parse_from(
        args: &[String],
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ParseOutcome> {
        let mut opts = Self::default();

        // Apply environment variable defaults first
        if let Some(val) = env("HOVERTIP_DEMO_MODE") {
            opts.mode = Mode::parse(&val)
                .ok_or_else(|| ParseOutcome::Invalid(format!("Invalid HOVERTIP_DEMO_MODE value: {val}")))?;
        }
        if let Some(val) = env("HOVERTIP_DEMO_POLICY") {
            opts.policy = Some(PathBuf::from(val));
        }

        // Parse command-line args (override env vars)
        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Err(ParseOutcome::Help),
                "--version" | "-V" => return Err(ParseOutcome::Version),
                "--suppress-focus" => opts.suppress_focus = true,
                "--log-json" => opts.log_json = true,
                other => {
                    if let Some(val) = other.strip_prefix("--mode=") {
                        opts.mode = Mode::parse(val)
                            .ok_or_else(|| ParseOutcome::Invalid(format!("Invalid --mode value: {val}")))?;
                    } else if let Some(val) = other.strip_prefix("--policy=") {
                        opts.policy = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--rest-ms=") {
                        opts.rest_ms = Some(parse_ms("--rest-ms", val)?);
                    } else if let Some(val) = other.strip_prefix("--linger-ms=") {
                        opts.linger_ms = Some(parse_ms("--linger-ms", val)?);
                    } else {
                        return Err(ParseOutcome::Invalid(format!("Unknown argument: {other}")));
                    }
                }
            }
        }

        Ok(opts)
    }
}

impl Opts {
    /// Build the coordinator configuration.
    ///
    /// Layers, lowest first: defaults or the policy file, environment
    /// (through `env`), then explicit flags.
    pub fn tooltip_config(&self, env: impl Fn(&str) -> Option<String>) -> hovertip::Result<TooltipConfig> {
        let mut config = match &self.policy {
            Some(path) => load_policy(path)?.into_config()?,
            None => TooltipConfig::default(),
        };
        config = config.with_env_overrides(env);

        if let Some(ms) = self.rest_ms {
            config = config.rest_delay(Duration::from_millis(ms));
        }
        if let Some(ms) = self.linger_ms {
            config = config.linger_delay(Duration::from_millis(ms));
        }
        if self.suppress_focus {
            config = config.suppress_focus(true);
        }
        Ok(config)
    }
}

/// Load a policy file; `.json` files are JSON, anything else is TOML.
fn load_policy(path: &Path) -> hovertip::Result<TooltipPolicy> {
    let policy = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => TooltipPolicy::from_json_file(path)?,
        _ => TooltipPolicy::from_toml_file(path)?,
    };
    tracing::debug!(path = %path.display(), ?policy, "policy loaded");
    Ok(policy)
}

/// Why parsing stopped without producing options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Help,
    Version,
    Invalid(String),
}

fn parse_ms(flag: &str, val: &str) -> Result<u64, ParseOutcome> {
    val.parse()
        .map_err(|_| ParseOutcome::Invalid(format!("Invalid {flag} value: {val}")))
}
