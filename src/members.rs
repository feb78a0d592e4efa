//! Loyalty member records and lookup state.
//!
//! Members are keyed by phone number and hold a points balance. The client
//! side normalises phones to digits and requires non-empty values; format
//! and uniqueness enforcement stay behind the backend.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A loyalty-program customer as the backend stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub points: i64,
}

/// Outcome of a member lookup for the current transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MemberStatus {
    /// No phone entered; anonymous checkout.
    #[default]
    Unset,
    /// The phone matched an existing member.
    Found(Member),
    /// The phone was unknown; this member is registered during checkout.
    New(Member),
}

impl MemberStatus {
    pub fn member(&self) -> Option<&Member> {
        match self {
            MemberStatus::Unset => None,
            MemberStatus::Found(m) | MemberStatus::New(m) => Some(m),
        }
    }

    /// Points balance before the current transaction. Zero when anonymous
    /// (a freshly registered member starts at zero too).
    pub fn points(&self) -> i64 {
        self.member().map(|m| m.points).unwrap_or(0)
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, MemberStatus::Unset)
    }

    pub fn is_new(&self) -> bool {
        matches!(self, MemberStatus::New(_))
    }
}

/// Keep only the digits of a phone number.
pub fn normalize_phone(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect::<String>()
}

/// Validate the fields needed to register a new member.
pub fn validate_registration(name: &str, phone: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::MissingMemberName);
    }
    if normalize_phone(phone).is_empty() {
        return Err(ValidationError::MissingMemberPhone);
    }
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_phone_keeps_digits_only() {
        assert_eq!(normalize_phone("089-999-8888"), "0899998888");
        assert_eq!(normalize_phone(" (089) 999 8888 "), "0899998888");
        assert_eq!(normalize_phone("no digits"), "");
    }

    #[test]
    fn test_status_points_default_to_zero() {
        assert_eq!(MemberStatus::Unset.points(), 0);

        let member = Member {
            name: "Somchai".to_string(),
            phone: "0899998888".to_string(),
            points: 80,
        };
        assert_eq!(MemberStatus::Found(member.clone()).points(), 80);
        assert!(MemberStatus::New(member).is_new());
    }

    #[test]
    fn test_validate_registration() {
        assert_eq!(
            validate_registration("", "0899998888"),
            Err(ValidationError::MissingMemberName)
        );
        assert_eq!(
            validate_registration("Somchai", "---"),
            Err(ValidationError::MissingMemberPhone)
        );
        assert_eq!(validate_registration("Somchai", "089-999-8888"), Ok(()));
    }
}
