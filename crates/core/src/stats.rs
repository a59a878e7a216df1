//! Labeling statistics.
//!
//! The engine reports monotonic counters through a [`StatsSink`] shared by
//! every document it processes. [`LabelStats`] is the in-process sink; other
//! backends implement the trait.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// A named statistics counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    /// Documents run through the labeler.
    PagesLabeled,
    /// Documents where at least one role was inferred.
    PagesRoleAdded,
    NavigationalRoles,
    HeaderRoles,
    ContentRoles,
    MarginalRoles,
    /// Classified elements left without a role.
    ElementsUnlabeled,
    /// Elements whose signals disagreed.
    AmbiguousRoleLabels,
}

impl Counter {
    pub const ALL: [Counter; 8] = [
        Counter::PagesLabeled,
        Counter::PagesRoleAdded,
        Counter::NavigationalRoles,
        Counter::HeaderRoles,
        Counter::ContentRoles,
        Counter::MarginalRoles,
        Counter::ElementsUnlabeled,
        Counter::AmbiguousRoleLabels,
    ];

    /// The counter's external name.
    pub fn name(self) -> &'static str {
        match self {
            Counter::PagesLabeled => "pages_labeled",
            Counter::PagesRoleAdded => "pages_role_added",
            Counter::NavigationalRoles => "navigational_roles",
            Counter::HeaderRoles => "header_roles",
            Counter::ContentRoles => "content_roles",
            Counter::MarginalRoles => "marginal_roles",
            Counter::ElementsUnlabeled => "elements_unlabeled",
            Counter::AmbiguousRoleLabels => "ambiguous_role_labels",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Destination for counter increments.
pub trait StatsSink: Send + Sync {
    fn increment(&self, counter: Counter, delta: u64);
}

/// Sink that drops every increment.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStats;

impl StatsSink for NoopStats {
    fn increment(&self, _counter: Counter, _delta: u64) {}
}

/// Atomic in-memory counters.
#[derive(Debug, Default)]
pub struct LabelStats {
    counters: [AtomicU64; Counter::ALL.len()],
}

impl LabelStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, counter: Counter) -> u64 {
        self.counters[counter.index()].load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            pages_labeled: self.get(Counter::PagesLabeled),
            pages_role_added: self.get(Counter::PagesRoleAdded),
            navigational_roles: self.get(Counter::NavigationalRoles),
            header_roles: self.get(Counter::HeaderRoles),
            content_roles: self.get(Counter::ContentRoles),
            marginal_roles: self.get(Counter::MarginalRoles),
            elements_unlabeled: self.get(Counter::ElementsUnlabeled),
            ambiguous_role_labels: self.get(Counter::AmbiguousRoleLabels),
        }
    }
}

impl StatsSink for LabelStats {
    fn increment(&self, counter: Counter, delta: u64) {
        self.counters[counter.index()].fetch_add(delta, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`LabelStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub pages_labeled: u64,
    pub pages_role_added: u64,
    pub navigational_roles: u64,
    pub header_roles: u64,
    pub content_roles: u64,
    pub marginal_roles: u64,
    pub elements_unlabeled: u64,
    pub ambiguous_role_labels: u64,
}
