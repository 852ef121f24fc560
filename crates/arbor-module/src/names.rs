//! Entry name validation.
//!
//! Valid names:
//! - Must be non-empty
//! - Must not contain `/` (the path separator) or whitespace
//! - Must not contain control characters
//! - Must not start with `.`
//!
//! Reducer names additionally must not shadow the generic `push` mutation
//! every module carries.

use arbor_types::ModulePath;

use crate::error::{module_label, ConfigError};

/// Names no reducer (or reducer group) may take.
pub const RESERVED_REDUCER_NAMES: &[&str] = &["push"];

/// Validate a module, reducer, action, getter, selector, or state key name.
///
/// # Examples
///
/// ```
/// use arbor_module::names::validate_name;
/// use arbor_types::ModulePath;
///
/// let root = ModulePath::root();
/// assert!(validate_name(&root, "counter").is_ok());
/// assert!(validate_name(&root, "a/b").is_err());
/// assert!(validate_name(&root, "").is_err());
/// ```
pub fn validate_name(module: &ModulePath, name: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidName {
        module: module_label(module),
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if name.contains('/') {
        return Err(invalid("must not contain '/'"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }
    if name.chars().any(char::is_control) {
        return Err(invalid("must not contain control characters"));
    }
    if name.starts_with('.') {
        return Err(invalid("must not start with '.'"));
    }
    Ok(())
}

/// Validate a reducer or reducer-group name.
pub fn validate_reducer_name(module: &ModulePath, name: &str) -> Result<(), ConfigError> {
    validate_name(module, name)?;
    if RESERVED_REDUCER_NAMES.contains(&name) {
        return Err(ConfigError::ReservedName {
            module: module_label(module),
            name: name.to_string(),
        });
    }
    Ok(())
}
