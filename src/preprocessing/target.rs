//! Target column resolution

use crate::error::{LabError, Result};
use serde::{Deserialize, Serialize};

/// Recognized label column names, highest priority first
pub const TARGET_PRIORITY: [&str; 4] = ["type", "class", "class=e", "class=p"];

/// Outcome of picking the label column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetResolution {
    pub column: String,
    /// True when no recognized name was present and the last column was used
    pub fallback_used: bool,
}

/// Pick the label column from the table header.
///
/// Exact, case-sensitive name match against [`TARGET_PRIORITY`]; otherwise the
/// last column. Fails only for an empty header.
pub fn resolve_target<S: AsRef<str>>(columns: &[S]) -> Result<TargetResolution> {
    for candidate in TARGET_PRIORITY {
        if columns.iter().any(|c| c.as_ref() == candidate) {
            return Ok(TargetResolution {
                column: candidate.to_string(),
                fallback_used: false,
            });
        }
    }

    let last = columns
        .last()
        .ok_or_else(|| LabError::InputValidation("table has no columns".to_string()))?;

    Ok(TargetResolution {
        column: last.as_ref().to_string(),
        fallback_used: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let cols = ["class=p", "odor", "class", "type"];
        let r = resolve_target(&cols).unwrap();
        assert_eq!(r.column, "type");
        assert!(!r.fallback_used);

        let cols = ["class=p", "odor", "class=e"];
        assert_eq!(resolve_target(&cols).unwrap().column, "class=e");
    }

    #[test]
    fn test_fallback_to_last_column() {
        let cols = ["odor", "cap-shape", "label"];
        let r = resolve_target(&cols).unwrap();
        assert_eq!(r.column, "label");
        assert!(r.fallback_used);
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let cols = ["Class", "odor"];
        let r = resolve_target(&cols).unwrap();
        assert_eq!(r.column, "odor");
        assert!(r.fallback_used);
    }

    #[test]
    fn test_empty_header() {
        let cols: [&str; 0] = [];
        assert!(matches!(
            resolve_target(&cols),
            Err(LabError::InputValidation(_))
        ));
    }
}
