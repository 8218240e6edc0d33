//! Declarative branching on a permission decision.
//!
//! The gate knows nothing about the host's rendering model: it runs one of two
//! producers and hands back what that producer built.

use super::context::CheckContext;
use super::evaluator::check_permission;
use super::role::Role;

/// Run `on_allow` if the check passes, `on_deny` otherwise. A missing
/// producer yields `T::default()`.
pub fn render_gated<T, Y, N>(
    role: Option<Role>,
    action: &str,
    ctx: &CheckContext,
    on_allow: Option<Y>,
    on_deny: Option<N>,
) -> T
where
    T: Default,
    Y: FnOnce() -> T,
    N: FnOnce() -> T,
{
    if check_permission(role, action, ctx) {
        on_allow.map(|f| f()).unwrap_or_default()
    } else {
        on_deny.map(|f| f()).unwrap_or_default()
    }
}

/// Builder form of [`render_gated`].
///
/// ```
/// use note_rbac::authz::{actions, CanUser, CheckContext, Role};
///
/// let ctx = CheckContext::new().with_user(5).with_owner("5");
/// let label = CanUser::new(Some(Role::Baseline), actions::UPDATE_NOTE, &ctx)
///     .yes(|| "Edit".to_string())
///     .no(|| "Read only".to_string())
///     .render();
/// assert_eq!(label, "Edit");
/// ```
pub struct CanUser<'a, T> {
    with_role: Option<Role>,
    perform: &'a str,
    data: &'a CheckContext,
    yes: Option<Box<dyn FnOnce() -> T + 'a>>,
    no: Option<Box<dyn FnOnce() -> T + 'a>>,
}

impl<'a, T: Default> CanUser<'a, T> {
    pub fn new(with_role: Option<Role>, perform: &'a str, data: &'a CheckContext) -> Self {
        Self {
            with_role,
            perform,
            data,
            yes: None,
            no: None,
        }
    }

    pub fn yes(mut self, producer: impl FnOnce() -> T + 'a) -> Self {
        self.yes = Some(Box::new(producer));
        self
    }

    pub fn no(mut self, producer: impl FnOnce() -> T + 'a) -> Self {
        self.no = Some(Box::new(producer));
        self
    }

    pub fn render(self) -> T {
        render_gated(self.with_role, self.perform, self.data, self.yes, self.no)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::authz::actions;

    #[test]
    fn picks_allow_branch() {
        let out = render_gated(
            Some(Role::Employee),
            actions::EXPORT_NOTE,
            &CheckContext::new(),
            Some(|| "export"),
            Some(|| "hidden"),
        );
        assert_eq!(out, "export");
    }

    #[test]
    fn picks_deny_branch() {
        let out = render_gated(
            Some(Role::Baseline),
            actions::EXPORT_NOTE,
            &CheckContext::new(),
            Some(|| "export"),
            Some(|| "hidden"),
        );
        assert_eq!(out, "hidden");
    }

    #[test]
    fn missing_producer_yields_default() {
        let out: Option<&str> = render_gated(
            None,
            actions::VIEW_NOTE,
            &CheckContext::new(),
            Some(|| Some("view")),
            None::<fn() -> Option<&'static str>>,
        );
        assert_eq!(out, None);
    }

    #[test]
    fn only_the_chosen_producer_runs() {
        let yes_calls = Cell::new(0);
        let no_calls = Cell::new(0);
        let ctx = CheckContext::new().with_user(5).with_owner(5);

        CanUser::new(Some(Role::Baseline), actions::READ_OWN_NOTE, &ctx)
            .yes(|| yes_calls.set(yes_calls.get() + 1))
            .no(|| no_calls.set(no_calls.get() + 1))
            .render();

        assert_eq!(yes_calls.get(), 1);
        assert_eq!(no_calls.get(), 0);
    }

    #[test]
    fn builder_without_producers_renders_nothing() {
        let ctx = CheckContext::new();
        let out: String = CanUser::new(Some(Role::Admin), actions::DELETE_NOTE, &ctx).render();
        assert!(out.is_empty());
    }
}
