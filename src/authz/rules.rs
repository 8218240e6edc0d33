//! Row-level rules: per-action predicates over a [`CheckContext`].

use serde::Serialize;

use super::context::CheckContext;

/// A dynamic rule, evaluated against the request context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicRule {
    /// The acting user owns the resource.
    Owner,
    /// The caller has admin standing. No ids required.
    Admin,
    /// Both ids known, then owner or admin.
    OwnerOrAdmin,
    /// Both ids known, then admin. Owning the resource is not enough.
    AdminWithIdentity,
}

impl DynamicRule {
    pub fn evaluate(self, ctx: &CheckContext) -> bool {
        match self {
            DynamicRule::Owner => ctx.is_owner(),
            DynamicRule::Admin => ctx.is_admin(),
            DynamicRule::OwnerOrAdmin => ctx.has_identities() && (ctx.is_owner() || ctx.is_admin()),
            DynamicRule::AdminWithIdentity => ctx.has_identities() && ctx.is_admin(),
        }
    }
}

/// Named groups of `(action, rule)` entries, merged into role policies.
pub type RuleBundle = &'static [(&'static str, DynamicRule)];

pub mod bundles {
    use super::super::actions;
    use super::{DynamicRule, RuleBundle};

    pub const READ_OWN_NOTE: RuleBundle = &[(actions::READ_OWN_NOTE, DynamicRule::Owner)];

    /// Admins may read any note. The entry is keyed `ReadOwnNote`, not
    /// `ReadAllNote`: merging this bundle replaces the ownership rule for that
    /// action, so a role carrying it loses the "read own note" check.
    /// Whether a separate `ReadAllNote` action was intended is unresolved.
    pub const READ_ALL_NOTE: RuleBundle = &[(actions::READ_OWN_NOTE, DynamicRule::Admin)];

    pub const UPDATE_NOTE: RuleBundle = &[(actions::UPDATE_NOTE, DynamicRule::OwnerOrAdmin)];

    pub const DELETE_NOTE: RuleBundle = &[(actions::DELETE_NOTE, DynamicRule::AdminWithIdentity)];
}
