use async_trait::async_trait;
use serde::Serialize;

use super::context::CheckContext;
use super::policy::{rules, PolicyTable};
use super::role::Role;
use super::rules::DynamicRule;

/// Which step of the evaluation settled the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// No role was given.
    NoRole,
    /// The role id does not name any known role.
    UnknownRole,
    /// The action is on the role's static allow-list.
    StaticAllow,
    /// Neither list mentions the action.
    NoRule,
    /// A dynamic rule decided.
    Rule {
        rule: DynamicRule,
        #[serde(skip)]
        allowed: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub action: String,
    pub allowed: bool,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Decision {
    fn new(role: Option<Role>, action: &str, outcome: Outcome) -> Self {
        let allowed = match outcome {
            Outcome::StaticAllow => true,
            Outcome::Rule { allowed, .. } => allowed,
            Outcome::NoRole | Outcome::UnknownRole | Outcome::NoRule => false,
        };
        Self {
            role,
            action: action.to_string(),
            allowed,
            outcome,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }
}

impl PolicyTable {
    /// Evaluation order:
    /// 1. no role -> deny
    /// 2. role without a policy -> deny (only reachable through
    ///    [`PolicyTable::evaluate_role_id`] and [`PolicyTable::evaluate_role_name`])
    /// 3. static allow-list -> allow, dynamic rules are not consulted
    /// 4. no dynamic rule for the action -> deny
    /// 5. the dynamic rule's verdict
    pub fn evaluate(&self, role: Option<Role>, action: &str, ctx: &CheckContext) -> Decision {
        let Some(role) = role else {
            return Decision::new(None, action, Outcome::NoRole);
        };
        let policy = self.policy(role);

        if policy.allows_statically(action) {
            return Decision::new(Some(role), action, Outcome::StaticAllow);
        }

        let outcome = match policy.rule_for(action) {
            Some(rule) => Outcome::Rule {
                rule,
                allowed: rule.evaluate(ctx),
            },
            None => Outcome::NoRule,
        };
        Decision::new(Some(role), action, outcome)
    }

    /// Same as [`PolicyTable::evaluate`] for a raw numeric role id.
    pub fn evaluate_role_id(&self, role_id: Option<i64>, action: &str, ctx: &CheckContext) -> Decision {
        match role_id {
            None => Decision::new(None, action, Outcome::NoRole),
            Some(id) => match Role::from_id(id) {
                Some(role) => self.evaluate(Some(role), action, ctx),
                None => Decision::new(None, action, Outcome::UnknownRole),
            },
        }
    }

    /// Same as [`PolicyTable::evaluate`] for a role given as text, either its
    /// numeric id or its name. Text that names no role is an unknown role.
    pub fn evaluate_role_name(&self, role: Option<&str>, action: &str, ctx: &CheckContext) -> Decision {
        match role {
            None => Decision::new(None, action, Outcome::NoRole),
            Some(raw) => match Role::resolve(raw) {
                Some(role) => self.evaluate(Some(role), action, ctx),
                None => Decision::new(None, action, Outcome::UnknownRole),
            },
        }
    }
}

pub fn evaluate(role: Option<Role>, action: &str, ctx: &CheckContext) -> Decision {
    rules().evaluate(role, action, ctx)
}

pub fn evaluate_role_id(role_id: Option<i64>, action: &str, ctx: &CheckContext) -> Decision {
    rules().evaluate_role_id(role_id, action, ctx)
}

pub fn evaluate_role_name(role: Option<&str>, action: &str, ctx: &CheckContext) -> Decision {
    rules().evaluate_role_name(role, action, ctx)
}

/// Is `role` allowed to perform `action` in `ctx`? Anything unmatched is a denial.
pub fn check_permission(role: Option<Role>, action: &str, ctx: &CheckContext) -> bool {
    evaluate(role, action, ctx).is_allowed()
}

pub fn check_role_id(role_id: Option<i64>, action: &str, ctx: &CheckContext) -> bool {
    evaluate_role_id(role_id, action, ctx).is_allowed()
}

/// Policy evaluator trait for pluggable authorization logic
#[async_trait]
pub trait PolicyEvaluator: Send + Sync {
    /// Check if the role has permission to perform an action
    async fn can(&self, role: Option<Role>, action: &str, ctx: &CheckContext) -> bool;
}

/// Evaluates against the process-wide policy table and logs the outcome.
#[derive(Debug, Clone, Default)]
pub struct DefaultPolicyEvaluator;

impl DefaultPolicyEvaluator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PolicyEvaluator for DefaultPolicyEvaluator {
    async fn can(&self, role: Option<Role>, action: &str, ctx: &CheckContext) -> bool {
        let decision = evaluate(role, action, ctx);
        let role_name = role.map(Role::as_str).unwrap_or("none");

        match decision.outcome {
            Outcome::StaticAllow => {
                tracing::debug!(role = %role_name, action = %action, "static permission match");
            }
            Outcome::Rule { rule, allowed } => {
                tracing::debug!(role = %role_name, action = %action, rule = ?rule, allowed, "dynamic rule evaluated");
            }
            Outcome::NoRole | Outcome::UnknownRole | Outcome::NoRule => {
                tracing::debug!(role = %role_name, action = %action, outcome = ?decision.outcome, "permission denied");
            }
        }

        decision.is_allowed()
    }
}
