use super::context::CheckContext;
use super::evaluator::{evaluate, Decision};
use super::role::Role;
use super::AuthzMode;
use crate::errors::{AuthzError, AuthzResult};

/// Apply a permission check at a call site according to `mode`.
///
/// The decision itself is the same as [`check_permission`](super::check_permission);
/// the mode only controls what happens on denial.
pub fn enforce(mode: AuthzMode, role: Option<Role>, action: &str, ctx: &CheckContext) -> AuthzResult<()> {
    if mode == AuthzMode::Off {
        return Ok(());
    }
    enforce_decision(mode, &evaluate(role, action, ctx))
}

/// Apply `mode` to a decision that has already been made.
pub fn enforce_decision(mode: AuthzMode, decision: &Decision) -> AuthzResult<()> {
    if mode == AuthzMode::Off {
        return Ok(());
    }

    let role_name = decision.role.map(Role::as_str).unwrap_or("none");
    let action = decision.action.as_str();

    if decision.is_allowed() {
        tracing::debug!(role = %role_name, action = %action, "permission granted");
        return Ok(());
    }

    match mode {
        AuthzMode::Advisory => {
            tracing::warn!(
                role = %role_name,
                action = %action,
                outcome = ?decision.outcome,
                "permission denied (advisory, allowing)"
            );
            Ok(())
        }
        AuthzMode::Strict | AuthzMode::Off => {
            tracing::debug!(role = %role_name, action = %action, outcome = ?decision.outcome, "permission denied");
            Err(AuthzError::forbidden(format!("{action} is not permitted for role {role_name}")))
        }
    }
}
