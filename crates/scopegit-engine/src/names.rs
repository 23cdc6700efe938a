//! Ref-name validation.
//!
//! Branch names follow `git check-ref-format --branch`:
//! - non-empty, and not `HEAD` or `@`
//! - no whitespace, control characters, `~ ^ : ? * [ \`
//! - no `..`, `@{`, or `//`
//! - no leading or trailing `/` or `.`, no trailing `.lock`
//! - no component starting with `.`
//!
//! Remote names are single components with the same character rules.

use crate::error::{EngineError, EngineResult};

const FORBIDDEN_CHARS: &[char] = &['~', '^', ':', '?', '*', '[', '\\'];

fn invalid(name: &str, reason: impl Into<String>) -> EngineError {
    EngineError::InvalidRefName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn check_characters(name: &str) -> EngineResult<()> {
    if let Some(ch) = name
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_CHARS.contains(c))
    {
        return Err(invalid(name, format!("contains forbidden character {ch:?}")));
    }
    Ok(())
}

pub fn validate_branch_name(name: &str) -> EngineResult<()> {
    if name.is_empty() {
        return Err(invalid(name, "must not be empty"));
    }
    if name == "HEAD" || name == "@" {
        return Err(invalid(name, "is reserved"));
    }
    check_characters(name)?;
    for pattern in ["..", "@{", "//"] {
        if name.contains(pattern) {
            return Err(invalid(name, format!("must not contain {pattern:?}")));
        }
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid(name, "must not start or end with '/'"));
    }
    if name.ends_with('.') || name.ends_with(".lock") {
        return Err(invalid(name, "must not end with '.' or '.lock'"));
    }
    if name.split('/').any(|component| component.starts_with('.')) {
        return Err(invalid(name, "components must not start with '.'"));
    }
    Ok(())
}

pub fn validate_remote_name(name: &str) -> EngineResult<()> {
    if name.contains('/') {
        return Err(invalid(name, "remote name must not contain '/'"));
    }
    validate_branch_name(name)
}
