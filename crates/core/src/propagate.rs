//! Upward propagation of child roles.
//!
//! A closing child reports its final role to its parent's [`ChildRoles`]
//! tally. When the parent closes without a role of its own, the tally decides
//! whether it inherits one.

use crate::classify::{Basis, Label, Outcome, Role};

/// Roles of an element's labeled children, counted per role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChildRoles([u32; 4]);

impl ChildRoles {
    pub fn record(&mut self, role: Role) {
        self.0[role.index()] += 1;
    }

    pub fn count(&self, role: Role) -> u32 {
        self.0[role.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|n| *n == 0)
    }

    /// Distinct roles present.
    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(|r| self.count(*r) > 0)
    }
}

/// Role an unlabeled parent inherits from its children, if any.
///
/// - Unanimity: every labeled child has the same role and the parent's own
///   signals were not ambiguous.
/// - Marginal bubbling: every labeled child is marginal. Ambiguity does not
///   stop this.
///
/// Children split across roles leave the parent unlabeled. Parents that
/// already have a role, or whose outcome blocks propagation (excluded,
/// inside an anchor, role-ineligible tag), inherit nothing.
pub fn inherit(outcome: Outcome, children: &ChildRoles) -> Option<Label> {
    if outcome.label().is_some() || outcome.blocks_propagation() {
        return None;
    }

    let mut roles = children.roles();
    match (roles.next(), roles.next()) {
        (Some(Role::Marginal), None) => Some(Label::new(Role::Marginal, Basis::MarginalChildren)),
        (Some(role), None) if !outcome.is_ambiguous() => Some(Label::new(role, Basis::Unanimity)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Reason;

    fn tally(roles: &[Role]) -> ChildRoles {
        let mut children = ChildRoles::default();
        for role in roles {
            children.record(*role);
        }
        children
    }

    const NO_SIGNAL: Outcome = Outcome::Unlabeled(Reason::NoSignal);
    const AMBIGUOUS: Outcome = Outcome::Unlabeled(Reason::Ambiguous);

    #[test]
    fn test_unanimous_children() {
        let children = tally(&[Role::Navigational, Role::Navigational]);
        assert_eq!(inherit(NO_SIGNAL, &children), Some(Label::new(Role::Navigational, Basis::Unanimity)));
    }

    #[test]
    fn test_split_children() {
        let children = tally(&[Role::Header, Role::Navigational]);
        assert_eq!(inherit(NO_SIGNAL, &children), None);
    }

    #[test]
    fn test_marginal_children_break_unanimity() {
        let children = tally(&[Role::Content, Role::Marginal, Role::Content]);
        assert_eq!(inherit(NO_SIGNAL, &children), None);

        let children = tally(&[Role::Navigational, Role::Marginal]);
        assert_eq!(inherit(NO_SIGNAL, &children), None);
        assert_eq!(inherit(AMBIGUOUS, &children), None);
    }

    #[test]
    fn test_ambiguous_parent_blocks_unanimity() {
        let children = tally(&[Role::Content]);
        assert_eq!(inherit(AMBIGUOUS, &children), None);
    }

    #[test]
    fn test_marginal_bubbles_through_ambiguity() {
        let children = tally(&[Role::Marginal]);
        let expected = Some(Label::new(Role::Marginal, Basis::MarginalChildren));
        assert_eq!(inherit(NO_SIGNAL, &children), expected);
        assert_eq!(inherit(AMBIGUOUS, &children), expected);
        assert_eq!(inherit(Outcome::Unlabeled(Reason::TooSmall), &children), expected);
    }

    #[test]
    fn test_blocked_outcomes() {
        let children = tally(&[Role::Navigational]);
        assert_eq!(inherit(Outcome::Unlabeled(Reason::Excluded), &children), None);
        assert_eq!(inherit(Outcome::Unlabeled(Reason::InsideAnchor), &children), None);
        assert_eq!(inherit(Outcome::Unlabeled(Reason::Ineligible), &children), None);
        assert_eq!(inherit(Outcome::Unlabeled(Reason::Ineligible), &tally(&[Role::Marginal])), None);
        let labeled = Outcome::Labeled(Label::new(Role::Header, Basis::Prior));
        assert_eq!(inherit(labeled, &children), None);
    }

    #[test]
    fn test_no_children() {
        assert_eq!(inherit(NO_SIGNAL, &ChildRoles::default()), None);
        assert!(ChildRoles::default().is_empty());
    }
}
