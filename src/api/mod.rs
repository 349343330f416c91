//! # API Components
//!
//! Typed wrappers over the secrets server HTTP API.
//!
//! - [`system`]: mounting and listing auth methods (`/v1/sys/auth`)
//! - [`auth_methods`]: the auth methods themselves (`/v1/auth/{mount}`)
//! - [`response`]: the response envelope shared by all endpoints

pub mod auth_methods;
pub mod response;
pub mod system;

pub use response::{ApiResponse, AuthInfo, ListKeys, RawResponse};

use crate::errors::{Result, VaultError};

/// Maximum accepted length of a mount point or object name.
const MAX_SEGMENT_LEN: usize = 256;

/// Normalise a mount point: strip surrounding slashes and reject values that
/// would change the request path.
///
/// Nested mounts such as `team/cert` are allowed.
pub(crate) fn mount_segment(mount_point: &str) -> Result<String> {
    let trimmed = mount_point.trim().trim_matches('/');
    validate_segment(trimmed, "mount point", true)?;
    Ok(trimmed.to_string())
}

/// Validate an object name (role, CRL) used as the last path segment.
pub(crate) fn name_segment<'a>(name: &'a str, what: &str) -> Result<&'a str> {
    validate_segment(name, what, false)?;
    Ok(name)
}

fn validate_segment(value: &str, what: &str, allow_slash: bool) -> Result<()> {
    if value.is_empty() {
        return Err(VaultError::param_validation(format!("{} cannot be empty", what)));
    }

    if value.len() > MAX_SEGMENT_LEN {
        return Err(VaultError::param_validation(format!(
            "{} exceeds maximum length of {} characters (got {})",
            what,
            MAX_SEGMENT_LEN,
            value.len()
        )));
    }

    if !allow_slash && value.contains('/') {
        return Err(VaultError::param_validation(format!("{} cannot contain '/'", what)));
    }

    if value.split('/').any(|part| part == ".." || part == "." || part.is_empty()) {
        return Err(VaultError::param_validation(format!(
            "{} cannot contain empty or relative path segments",
            what
        )));
    }

    if value.chars().any(|c| matches!(c, '?' | '#' | '%') || c.is_whitespace() || c.is_control())
    {
        return Err(VaultError::param_validation(format!(
            "{} contains characters that are not allowed in a path",
            what
        )));
    }

    Ok(())
}
