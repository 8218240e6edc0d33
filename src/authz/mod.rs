//! Authorization module - Policy Tables and Decision Function
//!
//! This module implements the note RBAC policy engine with support for:
//! - Static (per-role allow-list) permissions
//! - Dynamic (per-action rule over request context) permissions
//! - Declarative gating of two producers on a decision
//! - Configurable enforcement modes (off/advisory/strict)

mod context;
mod evaluator;
mod gate;
mod guard;
mod policy;
mod role;
pub mod rules;

pub use context::{load_context, CheckContext, Identifier};
pub use evaluator::{
    check_permission, check_role_id, evaluate, evaluate_role_id, evaluate_role_name, Decision, DefaultPolicyEvaluator, Outcome,
    PolicyEvaluator,
};
pub use gate::{render_gated, CanUser};
pub use guard::{enforce, enforce_decision};
pub use policy::{admin, baseline, employee, rules, PolicyTable, RolePolicy};
pub use role::Role;
pub use rules::DynamicRule;

use std::sync::OnceLock;

use crate::errors::{AuthzError, AuthzResult};

/// Authorization enforcement mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthzMode {
    /// No permission checks (development mode)
    Off,
    /// Log denials but allow (testing mode)
    Advisory,
    /// Reject denied actions (production mode)
    Strict,
}

impl AuthzMode {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "advisory" => AuthzMode::Advisory,
            "strict" => AuthzMode::Strict,
            _ => AuthzMode::Off,
        }
    }

    /// Strict variant of [`AuthzMode::parse`] for explicit user input.
    pub fn try_parse(value: &str) -> AuthzResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "off" => Ok(AuthzMode::Off),
            "advisory" => Ok(AuthzMode::Advisory),
            "strict" => Ok(AuthzMode::Strict),
            _ => Err(AuthzError::configuration(format!(
                "unknown authorization mode `{value}`, expected off, advisory or strict"
            ))),
        }
    }

    pub fn from_env() -> Self {
        static MODE: OnceLock<AuthzMode> = OnceLock::new();
        *MODE.get_or_init(|| AuthzMode::parse(&std::env::var("AUTHZ_MODE").unwrap_or_default()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthzMode::Off => "off",
            AuthzMode::Advisory => "advisory",
            AuthzMode::Strict => "strict",
        }
    }
}

/// Well-known action names
pub mod actions {
    // Static
    pub const VIEW_NOTE: &str = "ViewNote";
    pub const CREATE_NOTE: &str = "CreateNote";
    pub const CREATE_TASK: &str = "CreateTask";
    pub const SEARCH_NOTE: &str = "SearchNote";
    pub const DELETE_NOTE: &str = "DeleteNote";
    pub const EXPORT_NOTE: &str = "ExportNote";

    // Dynamic
    pub const READ_OWN_NOTE: &str = "ReadOwnNote";
    pub const UPDATE_NOTE: &str = "UpdateNote";
}
