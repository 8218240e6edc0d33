use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use serde::Serialize;

use super::actions;
use super::role::Role;
use super::rules::{bundles, DynamicRule, RuleBundle};

/// What a single role may do: unconditional actions plus per-action rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RolePolicy {
    #[serde(rename = "static")]
    pub static_actions: BTreeSet<&'static str>,
    #[serde(rename = "dynamic")]
    pub dynamic_rules: BTreeMap<&'static str, DynamicRule>,
}

impl RolePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a lower role's policy.
    pub fn inherit(lower: &RolePolicy) -> Self {
        lower.clone()
    }

    pub fn allow(mut self, action: &'static str) -> Self {
        self.static_actions.insert(action);
        self
    }

    /// Merge a bundle into the dynamic rules. Later entries replace earlier
    /// ones under the same action.
    pub fn with_rules(mut self, bundle: RuleBundle) -> Self {
        for &(action, rule) in bundle {
            self.dynamic_rules.insert(action, rule);
        }
        self
    }

    pub fn allows_statically(&self, action: &str) -> bool {
        self.static_actions.contains(action)
    }

    pub fn rule_for(&self, action: &str) -> Option<DynamicRule> {
        self.dynamic_rules.get(action).copied()
    }
}

/// Role -> policy lookup. Built once, never mutated.
#[derive(Debug, Serialize)]
pub struct PolicyTable {
    baseline: RolePolicy,
    employee: RolePolicy,
    admin: RolePolicy,
}

impl PolicyTable {
    fn standard() -> Self {
        let baseline = RolePolicy::new()
            .allow(actions::CREATE_NOTE)
            .allow(actions::VIEW_NOTE)
            .allow(actions::CREATE_TASK)
            .allow(actions::SEARCH_NOTE)
            .with_rules(bundles::DELETE_NOTE)
            .with_rules(bundles::UPDATE_NOTE)
            .with_rules(bundles::READ_OWN_NOTE);

        // Employee: everything Baseline can do, plus export.
        let employee = RolePolicy::inherit(&baseline).allow(actions::EXPORT_NOTE);

        // Admin: everything Employee can do, plus delete. READ_ALL_NOTE
        // overrides the inherited ReadOwnNote rule.
        let admin = RolePolicy::inherit(&employee)
            .allow(actions::DELETE_NOTE)
            .with_rules(bundles::READ_ALL_NOTE);

        Self { baseline, employee, admin }
    }

    pub fn policy(&self, role: Role) -> &RolePolicy {
        match role {
            Role::Baseline => &self.baseline,
            Role::Employee => &self.employee,
            Role::Admin => &self.admin,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &RolePolicy)> + '_ {
        Role::ALL.into_iter().map(move |role| (role, self.policy(role)))
    }
}

static RULES: OnceLock<PolicyTable> = OnceLock::new();

/// The process-wide policy table.
pub fn rules() -> &'static PolicyTable {
    RULES.get_or_init(PolicyTable::standard)
}

pub fn baseline() -> &'static RolePolicy {
    rules().policy(Role::Baseline)
}

pub fn employee() -> &'static RolePolicy {
    rules().policy(Role::Employee)
}

pub fn admin() -> &'static RolePolicy {
    rules().policy(Role::Admin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_every_role() {
        let roles: Vec<Role> = rules().iter().map(|(role, _)| role).collect();
        assert_eq!(roles, Role::ALL.to_vec());
    }

    #[test]
    fn baseline_static_set() {
        let expected: BTreeSet<&str> = [actions::CREATE_NOTE, actions::VIEW_NOTE, actions::CREATE_TASK, actions::SEARCH_NOTE]
            .into_iter()
            .collect();
        assert_eq!(baseline().static_actions, expected);
    }

    #[test]
    fn employee_adds_export_only() {
        let added: Vec<_> = employee().static_actions.difference(&baseline().static_actions).copied().collect();
        assert_eq!(added, vec![actions::EXPORT_NOTE]);
        assert_eq!(employee().dynamic_rules, baseline().dynamic_rules);
    }

    #[test]
    fn admin_adds_delete() {
        let added: Vec<_> = admin().static_actions.difference(&employee().static_actions).copied().collect();
        assert_eq!(added, vec![actions::DELETE_NOTE]);
    }

    #[test]
    fn later_bundle_wins_on_same_key() {
        assert_eq!(baseline().rule_for(actions::READ_OWN_NOTE), Some(DynamicRule::Owner));
        assert_eq!(admin().rule_for(actions::READ_OWN_NOTE), Some(DynamicRule::Admin));
        assert_eq!(admin().rule_for(actions::UPDATE_NOTE), Some(DynamicRule::OwnerOrAdmin));
    }

    #[test]
    fn merge_order_is_respected() {
        let policy = RolePolicy::new()
            .with_rules(bundles::READ_ALL_NOTE)
            .with_rules(bundles::READ_OWN_NOTE);
        assert_eq!(policy.rule_for(actions::READ_OWN_NOTE), Some(DynamicRule::Owner));
    }

    #[test]
    fn static_sets_grow_with_privilege() {
        assert!(baseline().static_actions.is_subset(&employee().static_actions));
        assert!(employee().static_actions.is_subset(&admin().static_actions));
    }

    #[test]
    fn dumps_with_static_and_dynamic_keys() {
        let json = serde_json::to_value(baseline()).unwrap();
        assert!(json["static"].as_array().unwrap().iter().any(|v| v == "ViewNote"));
        assert_eq!(json["dynamic"]["UpdateNote"], "owner_or_admin");
    }
}
