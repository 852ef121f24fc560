//! Configuration errors raised while validating and installing descriptors.

use thiserror::Error;

/// Errors that make a module configuration uninstallable.
///
/// Every variant names the containing module (`<root>` for the top level)
/// and the offending entry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A name breaks the naming rules.
    #[error("invalid name '{name}' in module {module}: {reason}")]
    InvalidName {
        module: String,
        name: String,
        reason: String,
    },

    /// A name is reserved by the engine.
    #[error("name '{name}' in module {module} is reserved")]
    ReservedName { module: String, name: String },

    /// The same name appears twice in one category.
    #[error("duplicate {category} '{name}' in module {module}")]
    Duplicate {
        module: String,
        category: &'static str,
        name: String,
    },

    /// Two entries would occupy the same node of an access tree.
    #[error("name '{name}' in module {module} is used both as {first} and as {second}")]
    NameCollision {
        module: String,
        name: String,
        first: &'static str,
        second: &'static str,
    },

    /// The module's state kind cannot host the requested entries.
    #[error("state kind mismatch in module {module}: {reason}")]
    KindMismatch { module: String, reason: String },

    /// A nested reducer group targets a key the module state lacks.
    #[error("reducer group '{key}' in module {module} has no matching state key")]
    UnknownStateKey { module: String, key: String },

    /// A listener key does not resolve to a reducer or action.
    #[error("listener in module {module} targets unknown path '{target}'")]
    UnknownListenerTarget { module: String, target: String },

    /// A selector input does not resolve to a read or select accessor.
    #[error("selector '{selector}' in module {module} has unknown input '{input}'")]
    UnknownSelectorInput {
        module: String,
        selector: String,
        input: String,
    },

    /// Selector inputs form a cycle.
    #[error("selector '{path}' depends on itself")]
    SelectorCycle { path: String },

    /// A plugin rejected the descriptor.
    #[error("plugin '{plugin}' failed on module {module}: {message}")]
    Plugin {
        module: String,
        plugin: String,
        message: String,
    },
}

/// Render a module path for error messages.
pub fn module_label(path: &arbor_types::ModulePath) -> String {
    if path.is_root() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}
