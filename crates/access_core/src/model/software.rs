//! Software title model.

use serde::{Deserialize, Serialize};

use super::employee::ValidationError;

/// Storage-assigned software identifier.
pub type SoftwareId = i64;

/// One software title that access can be granted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Software {
    pub id: SoftwareId,
    /// Unique display name. Case-sensitive in storage.
    pub name: String,
}

/// Trims a candidate software name and rejects blank input.
pub fn normalize_software_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankField("software.name"));
    }
    Ok(trimmed.to_string())
}
