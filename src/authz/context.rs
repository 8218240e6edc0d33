use std::convert::Infallible;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AuthzError, AuthzResult};

/// A user or owner id, numeric or textual.
///
/// Callers hand over whatever representation they hold, so two identifiers
/// are compared by their canonical string form: `5` and `"5"` are the same.
///
/// JSON numbers outside `i64` (large unsigned ids, fractional values) are kept
/// in their canonical text form; integral floats such as `5.0` become `5`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Identifier {
    Number(i64),
    Text(String),
}

impl Identifier {
    /// Zero and the empty string count as "no id".
    pub fn is_present(&self) -> bool {
        match self {
            Identifier::Number(n) => *n != 0,
            Identifier::Text(s) => !s.is_empty(),
        }
    }

    pub fn canonical(&self) -> String {
        self.to_string()
    }

    pub fn same_as(&self, other: &Identifier) -> bool {
        match (self, other) {
            (Identifier::Number(a), Identifier::Number(b)) => a == b,
            (Identifier::Text(a), Identifier::Text(b)) => a == b,
            _ => self.canonical() == other.canonical(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Number(n) => write!(f, "{n}"),
            Identifier::Text(s) => f.write_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(IdentifierVisitor)
    }
}

struct IdentifierVisitor;

impl Visitor<'_> for IdentifierVisitor {
    type Value = Identifier;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a numeric or string id")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Identifier, E> {
        Ok(Identifier::Number(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Identifier, E> {
        Ok(match i64::try_from(value) {
            Ok(n) => Identifier::Number(n),
            Err(_) => Identifier::Text(value.to_string()),
        })
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Identifier, E> {
        // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound.
        if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 {
            Ok(Identifier::Number(value as i64))
        } else {
            Ok(Identifier::Text(value.to_string()))
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Identifier, E> {
        Ok(Identifier::Text(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Identifier, E> {
        Ok(Identifier::Text(value))
    }
}

/// Numeric input becomes a number, anything else is kept as text.
impl FromStr for Identifier {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<i64>() {
            Ok(n) => Identifier::Number(n),
            Err(_) => Identifier::Text(s.to_string()),
        })
    }
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Identifier::Number(value)
    }
}

impl From<i32> for Identifier {
    fn from(value: i32) -> Self {
        Identifier::Number(value.into())
    }
}

impl From<u32> for Identifier {
    fn from(value: u32) -> Self {
        Identifier::Number(value.into())
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Identifier::Text(value.to_string())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Identifier::Text(value)
    }
}

impl From<Uuid> for Identifier {
    fn from(value: Uuid) -> Self {
        Identifier::Text(value.to_string())
    }
}

/// Caller and target resource for dynamic rule checks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CheckContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Identifier>,
    /// Reserved for unit-scoped rules; no current rule reads it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_unit_id: Option<Identifier>,
    /// Reserved for unit-scoped rules; no current rule reads it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
}

impl CheckContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user_id: impl Into<Identifier>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_owner(mut self, owner_id: impl Into<Identifier>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn with_units(mut self, user_unit_id: impl Into<Identifier>, unit_id: impl Into<Identifier>) -> Self {
        self.user_unit_id = Some(user_unit_id.into());
        self.unit_id = Some(unit_id.into());
        self
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = Some(is_admin);
        self
    }

    pub fn with_private(mut self, is_private: bool) -> Self {
        self.is_private = Some(is_private);
        self
    }

    /// Both the acting user and the resource owner are known.
    pub fn has_identities(&self) -> bool {
        let present = |id: &Option<Identifier>| id.as_ref().is_some_and(Identifier::is_present);
        present(&self.user_id) && present(&self.owner_id)
    }

    pub fn is_owner(&self) -> bool {
        match (&self.user_id, &self.owner_id) {
            (Some(user), Some(owner)) if user.is_present() && owner.is_present() => user.same_as(owner),
            _ => false,
        }
    }

    /// Only an explicit `true` grants admin standing.
    pub fn is_admin(&self) -> bool {
        self.is_admin == Some(true)
    }

    pub fn from_json_str(input: &str) -> AuthzResult<Self> {
        let de = &mut serde_json::Deserializer::from_str(input);
        let ctx = serde_path_to_error::deserialize(&mut *de)?;
        de.end().map_err(|err| AuthzError::invalid_context(err.to_string()))?;
        Ok(ctx)
    }
}

/// Read a JSON context document from disk.
pub fn load_context(path: impl AsRef<Path>) -> AuthzResult<CheckContext> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    CheckContext::from_json_str(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_and_text_ids_compare_canonically() {
        assert!(Identifier::from(5).same_as(&Identifier::from("5")));
        assert!(!Identifier::from(5).same_as(&Identifier::from("05")));
        assert!(!Identifier::from(5).same_as(&Identifier::from(6)));
    }

    #[test]
    fn json_numbers_normalize() {
        let parse = |raw: &str| serde_json::from_str::<Identifier>(raw).unwrap();
        assert_eq!(parse("5.0"), Identifier::Number(5));
        assert_eq!(parse("-0.0"), Identifier::Number(0));
        assert_eq!(parse("5.5"), Identifier::Text("5.5".into()));
        assert_eq!(parse("18446744073709551615"), Identifier::Text("18446744073709551615".into()));
        assert!(serde_json::from_str::<Identifier>("true").is_err());
    }

    #[test]
    fn parses_cli_input() {
        assert_eq!("42".parse::<Identifier>().unwrap(), Identifier::Number(42));
        assert_eq!("u-42".parse::<Identifier>().unwrap(), Identifier::Text("u-42".into()));
    }

    #[test]
    fn zero_and_empty_are_absent() {
        assert!(!Identifier::from(0).is_present());
        assert!(!Identifier::from("").is_present());
        assert!(Identifier::from("0").is_present());
    }

    #[test]
    fn ownership_requires_both_ids() {
        assert!(!CheckContext::new().with_user(5).is_owner());
        assert!(!CheckContext::new().with_owner(5).is_owner());
        assert!(CheckContext::new().with_user(5).with_owner("5").is_owner());
        assert!(!CheckContext::new().with_user(0).with_owner(0).is_owner());
    }

    #[test]
    fn uuid_ids_match_their_text_form() {
        let id = Uuid::new_v4();
        let ctx = CheckContext::new().with_user(id).with_owner(id.to_string());
        assert!(ctx.is_owner());
    }

    #[test]
    fn only_explicit_true_is_admin() {
        assert!(!CheckContext::new().is_admin());
        assert!(!CheckContext::new().with_admin(false).is_admin());
        assert!(CheckContext::new().with_admin(true).is_admin());
    }

    #[test]
    fn parses_camel_case_json() {
        let ctx = CheckContext::from_json_str(r#"{"userId": 5, "ownerId": "5", "isAdmin": false}"#).unwrap();
        assert_eq!(ctx.user_id, Some(Identifier::Number(5)));
        assert_eq!(ctx.owner_id, Some(Identifier::Text("5".into())));
        assert_eq!(ctx.is_admin, Some(false));
        assert!(ctx.is_owner());
    }

    #[test]
    fn rejects_unknown_keys_with_path() {
        let err = CheckContext::from_json_str(r#"{"userId": 5, "onwerId": 5}"#).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("onwerId"), "unexpected message: {message}");
    }

    #[test]
    fn reports_path_of_bad_field() {
        let err = CheckContext::from_json_str(r#"{"isAdmin": "yes"}"#).unwrap_err();
        assert!(err.to_string().contains("isAdmin"), "unexpected message: {err}");
    }
}
