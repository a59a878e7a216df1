//! The labeling engine.
//!
//! [`LabelEngine`] consumes a depth-first [`Event`] stream for one document.
//! Elements are classified when they close and their output is held back as
//! pending items, so a role decided at close time can still be written into
//! the element's start tag. [`LabelEngine::flush`] renders everything pending
//! and freezes it: whatever was emitted is never touched again, and elements
//! still open at that point forfeit their label.
//!
//! # Example
//!
//! ```rust
//! use rolemark_core::{LabelConfig, LabelEngine, StartTag};
//!
//! let mut engine = LabelEngine::without_stats(LabelConfig::default());
//! engine.open_tag(StartTag::new("nav"));
//! engine.text("Home");
//! engine.close_tag("nav");
//! let summary = engine.finish();
//!
//! assert_eq!(summary.ids.navigational, vec!["rolemark-0".to_string()]);
//! assert!(engine.take_output().starts_with("<nav id=\"rolemark-0\" data-mobile-role=\"navigational\">Home</nav>"));
//! ```

use crate::annotate::{
    IdRegistry, RoleIds, SUMMARY_ATTRIBUTE, debug_comment, is_generated_comment, render_end_tag, render_start_tag,
    render_summary,
};
use crate::classify::{Basis, ClassifyInput, Label, classify, is_eligible};
use crate::config::{ClassRules, LabelConfig};
use crate::event::{Event, StartTag};
use crate::features::FeatureSnapshot;
use crate::frontier::{ElementId, Frontier, Status};
use crate::propagate::inherit;
use crate::stats::{Counter, NoopStats, StatsSink};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Output held back until the next flush or the end of the document.
#[derive(Debug, Clone)]
enum Item {
    Start(ElementId),
    /// An element's end; `text` is `None` when it was closed implicitly.
    End { id: ElementId, text: Option<String> },
    Raw(String),
    Summary,
}

/// What a finished document produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LabelSummary {
    /// Identifiers per role, in document order.
    pub ids: RoleIds,
    /// Elements carrying a role, explicit ones included.
    pub labeled: u64,
    /// Roles decided by the engine rather than the page author.
    pub inferred: u64,
    /// Classified, role-eligible elements left without a role.
    pub unlabeled: u64,
    /// Elements whose signals tied.
    pub ambiguous: u64,
    /// Flushes seen while processing.
    pub flushes: u64,
    /// Features of the whole document.
    pub root: FeatureSnapshot,
}

/// Streaming labeler for a single document.
pub struct LabelEngine {
    config: LabelConfig,
    rules: ClassRules,
    stats: Arc<dyn StatsSink>,
    frontier: Frontier,
    ids: IdRegistry,
    pending: Vec<Item>,
    output: String,
    summary_placed: bool,
    summary_pending: bool,
    skipping_summary: bool,
    inferred: u64,
    unlabeled: u64,
    ambiguous: u64,
    flushes: u64,
    finished: bool,
}

impl LabelEngine {
    pub fn new(config: LabelConfig, stats: Arc<dyn StatsSink>) -> Self {
        let rules = config.class_rules();
        let frontier = Frontier::with_id_prefix(config.id_prefix());
        Self {
            config,
            rules,
            stats,
            frontier,
            ids: IdRegistry::new(),
            pending: Vec::new(),
            output: String::new(),
            summary_placed: false,
            summary_pending: false,
            skipping_summary: false,
            inferred: 0,
            unlabeled: 0,
            ambiguous: 0,
            flushes: 0,
            finished: false,
        }
    }

    /// Engine whose counters go nowhere.
    pub fn without_stats(config: LabelConfig) -> Self {
        Self::new(config, Arc::new(NoopStats))
    }

    pub fn config(&self) -> &LabelConfig {
        &self.config
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Dispatches one event.
    pub fn handle(&mut self, event: Event) {
        match event {
            Event::OpenTag(start) => self.open_tag(start),
            Event::Text(text) => self.text(&text),
            Event::Comment(text) => self.comment(&text),
            Event::Doctype(raw) => self.doctype(&raw),
            Event::Raw(raw) => self.raw(&raw),
            Event::CloseTag(name) => self.close_tag(&name),
        }
    }

    pub fn open_tag(&mut self, start: StartTag) {
        if self.ignoring("open tag") {
            return;
        }
        if !self.config.enabled {
            self.output.push_str(&render_start_tag(&start, None, None));
            return;
        }
        if start.name.eq_ignore_ascii_case("script") && start.get(SUMMARY_ATTRIBUTE).is_some() {
            trace!("dropping previous summary block");
            self.skipping_summary = !start.void;
            return;
        }

        trace!(tag = %start.name, "open");
        let void = start.void;
        let id = self.frontier.open(start);
        let taken = self.frontier.get(id).explicit_id().and_then(|explicit| self.ids.reserve(explicit));
        if let Some(holder) = taken {
            self.rename(holder);
        }
        self.pending.push(Item::Start(id));
        if void {
            self.close_top(None);
        }
    }

    pub fn text(&mut self, text: &str) {
        if self.ignoring("text") {
            return;
        }
        if !self.config.enabled {
            self.output.push_str(text);
            return;
        }
        self.frontier.text(text);
        self.pending.push(Item::Raw(text.to_string()));
    }

    /// A comment, without its delimiters.
    pub fn comment(&mut self, text: &str) {
        if self.ignoring("comment") {
            return;
        }
        let raw = format!("<!--{text}-->");
        if !self.config.enabled {
            self.output.push_str(&raw);
        } else if is_generated_comment(text) {
            trace!("dropping generated comment");
        } else {
            self.pending.push(Item::Raw(raw));
        }
    }

    /// A doctype, rendered back to markup.
    pub fn doctype(&mut self, raw: &str) {
        self.raw(raw);
    }

    /// Markup that passes through untouched.
    pub fn raw(&mut self, raw: &str) {
        if self.ignoring("markup") {
            return;
        }
        if !self.config.enabled {
            self.output.push_str(raw);
        } else {
            self.pending.push(Item::Raw(raw.to_string()));
        }
    }

    /// Closes the innermost open element named `name`, implicitly closing
    /// anything opened inside it. An unmatched end tag passes through.
    pub fn close_tag(&mut self, name: &str) {
        if self.skipping_summary {
            if name.eq_ignore_ascii_case("script") {
                self.skipping_summary = false;
            }
            return;
        }
        if self.ignoring("close tag") {
            return;
        }
        let end = render_end_tag(name);
        if !self.config.enabled {
            self.output.push_str(&end);
            return;
        }

        let matched = self.frontier.find_open(name);
        if let Some(position) = matched {
            while self.frontier.open_elements().len() > position + 1 {
                self.close_top(None);
            }
        }
        if name.eq_ignore_ascii_case("body") && !self.summary_placed {
            self.summary_placed = true;
            self.summary_pending = true;
            self.pending.push(Item::Summary);
        }
        match matched {
            Some(_) => self.close_top(Some(end)),
            None => {
                trace!(tag = name, "unmatched end tag");
                self.pending.push(Item::Raw(end));
            }
        }
    }

    /// Renders pending output and freezes every element seen so far.
    pub fn flush(&mut self) {
        if self.finished || !self.config.enabled {
            return;
        }
        self.render_pending();
        let frozen = self.frontier.flush();
        self.flushes += 1;
        debug!(frozen, open = self.frontier.open_elements().len(), "flush");
    }

    /// Closes what is still open, emits the summary block and reports page
    /// statistics. Later calls return an empty summary.
    pub fn finish(&mut self) -> LabelSummary {
        if self.finished {
            warn!("finish called twice");
            return LabelSummary::default();
        }
        self.finished = true;
        if !self.config.enabled {
            return LabelSummary::default();
        }

        while !self.frontier.open_elements().is_empty() {
            self.close_top(None);
        }
        if !self.summary_pending {
            self.pending.push(Item::Summary);
            self.summary_pending = true;
        }
        self.render_pending();

        let ids = self.role_ids();
        self.stats.increment(Counter::PagesLabeled, 1);
        if self.inferred > 0 {
            self.stats.increment(Counter::PagesRoleAdded, 1);
        }
        info!(
            elements = self.frontier.len(),
            labeled = ids.len(),
            inferred = self.inferred,
            unlabeled = self.unlabeled,
            ambiguous = self.ambiguous,
            "page labeled"
        );

        LabelSummary {
            labeled: ids.len() as u64,
            ids,
            inferred: self.inferred,
            unlabeled: self.unlabeled,
            ambiguous: self.ambiguous,
            flushes: self.flushes,
            root: self.frontier.totals().root_snapshot(),
        }
    }

    /// Takes the output rendered so far.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    fn ignoring(&self, what: &str) -> bool {
        if self.finished {
            warn!(event = what, "event after finish ignored");
            return true;
        }
        self.skipping_summary
    }

    /// Pops the innermost open element and settles it.
    fn close_top(&mut self, text: Option<String>) {
        let Some(id) = self.frontier.pop() else {
            return;
        };
        self.pending.push(Item::End { id, text });
        let element = self.frontier.get(id);
        if element.status == Status::ClosedPending && !element.is_structural() {
            self.settle(id);
        }
    }

    /// Classifies a freshly closed element, applies propagation and reports
    /// its role to the parent.
    fn settle(&mut self, id: ElementId) {
        let element = self.frontier.get(id);
        let Some(snapshot) = element.snapshot.as_ref() else {
            return;
        };
        let input = ClassifyInput {
            tag: &element.tag,
            start: &element.start,
            snapshot,
            in_anchor: element.in_anchor,
            has_labeled_children: !element.child_roles.is_empty(),
        };
        let outcome = classify(&input, &self.config.thresholds, &self.rules);
        let label = outcome.label().or_else(|| inherit(outcome, &element.child_roles));
        let eligible = is_eligible(&element.tag);
        let parent = element.parent;

        self.frontier.get_mut(id).outcome = Some(outcome);
        if let Some(label) = label {
            self.apply_label(id, label);
        } else if eligible {
            self.unlabeled += 1;
            self.stats.increment(Counter::ElementsUnlabeled, 1);
            if outcome.is_ambiguous() {
                self.ambiguous += 1;
                self.stats.increment(Counter::AmbiguousRoleLabels, 1);
            }
        }
        if self.config.verbose && (eligible || label.is_some()) {
            self.assign_identifier(id);
        }

        let element = self.frontier.get(id);
        debug!(tag = %element.tag, ?outcome, role = ?element.role(), "settled");

        if let (Some(role), Some(parent)) = (element.role(), parent) {
            let parent = self.frontier.get_mut(parent);
            if parent.status != Status::Flushed && !parent.is_structural() {
                parent.child_roles.record(role);
            }
        }
    }

    fn apply_label(&mut self, id: ElementId, label: Label) {
        if !self.frontier.get_mut(id).set_label(label) {
            return;
        }
        if label.basis != Basis::Explicit {
            self.inferred += 1;
            self.stats.increment(label.role.counter(), 1);
        }
        self.assign_identifier(id);
    }

    fn assign_identifier(&mut self, id: ElementId) {
        let element = self.frontier.get(id);
        if element.identifier.is_some() {
            return;
        }
        let identifier = match element.explicit_id() {
            Some(explicit) => explicit.to_string(),
            None => {
                let (base, path) = self.frontier.id_path(id);
                self.ids.synthesize(id, self.config.id_prefix(), base, &path)
            }
        };
        self.frontier.get_mut(id).identifier = Some(identifier);
    }

    /// Replaces a synthesized identifier that an element opened later carries
    /// as its own `id`. Output already written keeps the old one.
    fn rename(&mut self, holder: ElementId) {
        let element = self.frontier.get(holder);
        if element.status == Status::Flushed {
            warn!(id = ?element.identifier, "page reuses an identifier that was already written");
            return;
        }
        let (base, path) = self.frontier.id_path(holder);
        let identifier = self.ids.synthesize(holder, self.config.id_prefix(), base, &path);
        debug!(%identifier, "synthesized identifier renamed");
        self.frontier.get_mut(holder).identifier = Some(identifier);
    }

    fn render_pending(&mut self) {
        let items = std::mem::take(&mut self.pending);
        for item in items {
            match item {
                Item::Start(id) => {
                    let element = self.frontier.get(id);
                    let synthesized = element.identifier.as_deref().filter(|_| element.explicit_id().is_none());
                    let role = element.label().filter(|l| l.basis != Basis::Explicit).map(|l| l.role);
                    self.output.push_str(&render_start_tag(&element.start, synthesized, role));
                }
                Item::End { id, text } => {
                    if let Some(text) = text {
                        self.output.push_str(&text);
                    }
                    if let Some(comment) = self.debug_comment_for(id) {
                        self.output.push_str(&comment);
                    }
                }
                Item::Raw(raw) => self.output.push_str(&raw),
                Item::Summary if self.finished => {
                    let block = render_summary(&self.role_ids());
                    self.output.push_str(&block);
                }
                Item::Summary => {
                    debug!("summary slot flushed before the end of the document");
                    self.summary_pending = false;
                }
            }
        }
    }

    fn debug_comment_for(&self, id: ElementId) -> Option<String> {
        if !self.config.verbose {
            return None;
        }
        let element = self.frontier.get(id);
        let outcome = element.outcome?;
        if !is_eligible(&element.tag) && element.label().is_none() {
            return None;
        }
        let snapshot = element.snapshot.as_ref()?;

        let mut parent_role = None;
        let mut current = element.parent;
        while let Some(ancestor) = current {
            let ancestor = self.frontier.get(ancestor);
            if let Some(role) = ancestor.role() {
                parent_role = Some(role);
                break;
            }
            current = ancestor.parent;
        }

        Some(debug_comment(element.identifier.as_deref(), element.label(), Some(outcome), snapshot, parent_role))
    }

    fn role_ids(&self) -> RoleIds {
        let mut ids = RoleIds::default();
        for (_, element) in self.frontier.iter() {
            if let (Some(role), Some(identifier)) = (element.role(), &element.identifier) {
                ids.push(role, identifier.clone());
            }
        }
        ids
    }
}
