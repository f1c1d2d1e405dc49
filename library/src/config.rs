//! Console configuration.
//!
//! # Environment Variables
//!
//! - `LIBRARY_CLEAR_SCREEN`: clear the terminal before each menu (default: `true`)
//! - `LIBRARY_PAUSE_AFTER_ACTION`: wait for Enter after each action (default: `true`)
//!
//! Booleans accept `1`/`0`, `true`/`false`, `yes`/`no` and `on`/`off`,
//! case-insensitively. Unset variables take their default.

/// Console configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppConfig {
    /// Emit an ANSI clear-screen sequence before drawing the menu.
    pub clear_screen: bool,
    /// Prompt "Press Enter to continue..." after every action.
    pub pause_after_action: bool,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl AppConfig {
    pub const DEFAULT_CLEAR_SCREEN: bool = true;
    pub const DEFAULT_PAUSE_AFTER_ACTION: bool = true;

    pub const CLEAR_SCREEN_VAR: &'static str = "LIBRARY_CLEAR_SCREEN";
    pub const PAUSE_AFTER_ACTION_VAR: &'static str = "LIBRARY_PAUSE_AFTER_ACTION";

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let load = |name: &str, default: bool| {
            lookup(name).map_or(Ok(default), |value| parse_bool(name, &value))
        };

        Ok(Self {
            clear_screen: load(Self::CLEAR_SCREEN_VAR, Self::DEFAULT_CLEAR_SCREEN)?,
            pause_after_action: load(
                Self::PAUSE_AFTER_ACTION_VAR,
                Self::DEFAULT_PAUSE_AFTER_ACTION,
            )?,
        })
    }

    /// No screen clearing and no pauses: for scripted input and tests.
    #[must_use]
    pub const fn non_interactive() -> Self {
        Self {
            clear_screen: false,
            pause_after_action: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            clear_screen: Self::DEFAULT_CLEAR_SCREEN,
            pause_after_action: Self::DEFAULT_PAUSE_AFTER_ACTION,
        }
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("'{value}' is not a boolean (use true/false, yes/no, on/off or 1/0)"),
        }),
    }
}
