use arbor_module::Enhance;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Store-wide settings that are not part of any module descriptor.
///
/// ```
/// use arbor_store::StoreConfig;
///
/// let config = StoreConfig::from_toml_str(r#"
///     name = "app"
///     strict_listeners = false
///
///     [enhance]
///     auto_apply_actions = true
/// "#).unwrap();
/// assert_eq!(config.name, "app");
/// assert!(config.enhance.auto_apply_actions);
/// assert!(config.strict_selectors);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Label used in logs.
    pub name: String,
    /// Flags inherited by the root module and, through it, every module
    /// that does not set its own.
    pub enhance: Enhance,
    /// Reject listeners whose target is not a reducer or action of the
    /// store. When off, such listeners are kept and never fire.
    pub strict_listeners: bool,
    /// Reject selectors with unresolvable inputs or input cycles. When off,
    /// missing inputs read as `null` and a cyclic evaluation yields nothing.
    pub strict_selectors: bool,
}

impl StoreConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(source: &str) -> StoreResult<Self> {
        toml::from_str(source).map_err(|e| StoreError::ConfigFile(e.to_string()))
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "store".to_string(),
            enhance: Enhance::default(),
            strict_listeners: true,
            strict_selectors: true,
        }
    }
}
