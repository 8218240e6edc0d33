use std::fmt;

use serde::{Deserialize, Serialize};

/// Privilege tiers, lowest first.
///
/// The numeric id is only a stable identifier for the tier. Authorization
/// never compares roles by id; each role's policy lists what it may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Baseline,
    Employee,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Baseline, Role::Employee, Role::Admin];

    pub fn id(self) -> i64 {
        match self {
            Role::Baseline => 0,
            Role::Employee => 1,
            Role::Admin => 2,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.id() == id)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Baseline => "baseline",
            Role::Employee => "employee",
            Role::Admin => "admin",
        }
    }

    /// Resolve a role from user input: either the numeric id or the
    /// case-insensitive name.
    pub fn resolve(input: &str) -> Option<Self> {
        let input = input.trim();
        if let Ok(id) = input.parse::<i64>() {
            return Self::from_id(id);
        }
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(input))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_stable() {
        assert_eq!(Role::Baseline.id(), 0);
        assert_eq!(Role::Employee.id(), 1);
        assert_eq!(Role::Admin.id(), 2);
    }

    #[test]
    fn from_id_rejects_out_of_range() {
        assert_eq!(Role::from_id(2), Some(Role::Admin));
        assert_eq!(Role::from_id(3), None);
        assert_eq!(Role::from_id(-1), None);
    }

    #[test]
    fn resolve_accepts_names_and_ids() {
        assert_eq!(Role::resolve("1"), Some(Role::Employee));
        assert_eq!(Role::resolve("Admin"), Some(Role::Admin));
        assert_eq!(Role::resolve(" baseline "), Some(Role::Baseline));
        assert_eq!(Role::resolve("owner"), None);
        assert_eq!(Role::resolve("9"), None);
    }

    #[test]
    fn serializes_as_lowercase_name() {
        assert_eq!(serde_json::to_string(&Role::Employee).unwrap(), "\"employee\"");
        let parsed: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(parsed, Role::Admin);
    }
}
