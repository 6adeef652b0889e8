use crate::{DEFAULT_FIELD_BASE, DEFAULT_PREFIX};
use quote::format_ident;
use syn::Ident;
use thiserror::Error as ThisError;

/// Environment keys consulted by [`Config::from_env`].
pub const ENV_PREFIX: &str = "AUTODELEGATE_PREFIX";
pub const ENV_FIELD_BASE: &str = "AUTODELEGATE_FIELD_BASE";
pub const ENV_FORWARD_DEFAULTS: &str = "AUTODELEGATE_FORWARD_DEFAULTS";

pub const CONFIG_ENV_KEYS: &[&str] = &[ENV_PREFIX, ENV_FIELD_BASE, ENV_FORWARD_DEFAULTS];

///
/// ConfigError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConfigError {
    #[error("{key}: '{value}' is not a valid boolean flag")]
    InvalidFlag { key: String, value: String },

    #[error("{key}: '{value}' is not a valid identifier fragment")]
    InvalidIdentifier { key: String, value: String },
}

///
/// Config
///
/// Naming and forwarding policy for one generation run.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub prefix: String,
    pub field_base: String,

    /// Forward operations that carry a default body. When the capability is
    /// delegated, forwarding always wins over the trait default.
    pub forward_defaults: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            field_base: DEFAULT_FIELD_BASE.to_string(),
            forward_defaults: true,
        }
    }
}

impl Config {
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_field_base(mut self, field_base: impl Into<String>) -> Self {
        self.field_base = field_base.into();
        self
    }

    #[must_use]
    pub const fn forward_defaults(mut self, forward: bool) -> Self {
        self.forward_defaults = forward;
        self
    }

    /// Resolve the configuration from process environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve the configuration from an arbitrary key lookup.
    /// Unset or blank values keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(prefix) = read(ENV_PREFIX) {
            config.prefix = prefix;
        }
        if let Some(field_base) = read(ENV_FIELD_BASE) {
            config.field_base = field_base;
        }
        if let Some(flag) = read(ENV_FORWARD_DEFAULTS) {
            config.forward_defaults = parse_flag(ENV_FORWARD_DEFAULTS, &flag)?;
        }

        config.validate()?;

        Ok(config)
    }

    /// Both name parts must produce valid Rust identifiers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fragment(ENV_PREFIX, &self.prefix)?;
        check_fragment(ENV_FIELD_BASE, &self.field_base)?;

        Ok(())
    }

    /// Generated type name for `declaration` (`AutoDelegate_Name`).
    pub fn type_name(&self, declaration: &Ident) -> Result<Ident, ConfigError> {
        check_fragment(ENV_PREFIX, &self.prefix)?;

        Ok(format_ident!("{}_{}", self.prefix, declaration))
    }

    /// Generated field name for the target at `index` (`target0`).
    pub fn field_name(&self, index: usize) -> Result<Ident, ConfigError> {
        check_fragment(ENV_FIELD_BASE, &self.field_base)?;

        Ok(format_ident!("{}{}", self.field_base, index))
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

// The fragment is always followed by more characters (`_Decl` or an index),
// so a lone underscore is acceptable but keywords are not a concern.
fn check_fragment(key: &str, value: &str) -> Result<(), ConfigError> {
    let mut chars = value.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();

        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_generated_naming() {
        let config = Config::default();

        assert_eq!(config.prefix, "AutoDelegate");
        assert_eq!(config.field_base, "target");
        assert!(config.forward_defaults);
    }

    #[test]
    fn blank_overrides_keep_defaults() {
        let config = Config::from_lookup(lookup(&[(ENV_PREFIX, "  ")])).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn honors_overrides() {
        let config = Config::from_lookup(lookup(&[
            (ENV_PREFIX, "Fwd"),
            (ENV_FIELD_BASE, "inner"),
            (ENV_FORWARD_DEFAULTS, "off"),
        ]))
        .unwrap();

        assert_eq!(config.prefix, "Fwd");
        assert_eq!(config.field_base, "inner");
        assert!(!config.forward_defaults);
    }

    #[test]
    fn rejects_invalid_identifier() {
        let err = Config::from_lookup(lookup(&[(ENV_PREFIX, "9lives")])).unwrap_err();

        assert!(matches!(err, ConfigError::InvalidIdentifier { .. }), "{err}");
    }

    #[test]
    fn rejects_invalid_flag() {
        let err = Config::from_lookup(lookup(&[(ENV_FORWARD_DEFAULTS, "maybe")])).unwrap_err();

        assert_eq!(
            err,
            ConfigError::InvalidFlag {
                key: ENV_FORWARD_DEFAULTS.to_string(),
                value: "maybe".to_string(),
            }
        );
    }

    #[test]
    fn builder_setters_chain() {
        let config = Config::default()
            .with_prefix("Base")
            .with_field_base("slot")
            .forward_defaults(false);

        assert!(config.validate().is_ok());
        assert_eq!(config.prefix, "Base");
        assert_eq!(config.field_base, "slot");
        assert!(!config.forward_defaults);
    }

    #[test]
    fn name_builders_reject_unchecked_setters() {
        let config = Config::default().with_prefix("no spaces").with_field_base("");

        assert!(config.type_name(&format_ident!("Widget")).is_err());
        assert!(config.field_name(0).is_err());

        let config = Config::default();
        assert_eq!(
            config.type_name(&format_ident!("Widget")).unwrap(),
            "AutoDelegate_Widget"
        );
        assert_eq!(config.field_name(2).unwrap(), "target2");
    }
}
