//! The active frontier: every element seen so far, and the stack of those
//! still open.
//!
//! Elements live in an arena addressed by [`ElementId`]; parents and children
//! refer to each other by index. An element's status only moves forward:
//! `Open → ClosedPending → Flushed` (or straight from `Open` to `Flushed` when
//! a flush arrives first). Running counters are frozen into a snapshot the
//! moment an element stops being open.

use crate::classify::{Label, Outcome, Role};
use crate::event::StartTag;
use crate::features::{
    DocumentTotals, FeatureSnapshot, Preceding, RunningCounts, TextMeasure, keyword_hits, measure_text,
    significant_index,
};
use crate::propagate::ChildRoles;

/// Tags counted but never classified; they add no depth.
const STRUCTURAL_TAGS: &[&str] = &["html", "head", "body"];

/// Tags skipped when building identifier paths.
const PATH_TRANSPARENT_TAGS: &[&str] = &["html", "body"];

/// Tags whose text is not page content.
const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript", "template"];

pub fn is_structural(tag: &str) -> bool {
    STRUCTURAL_TAGS.contains(&tag)
}

/// Index of an element in the frontier arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl ElementId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Open,
    ClosedPending,
    Flushed,
}

#[derive(Debug, Clone)]
pub struct Element {
    /// Lowercase tag name.
    pub tag: String,
    /// The start tag as received.
    pub start: StartTag,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
    /// Depth among non-structural elements; 1 is top level, 0 for structural tags.
    pub depth: u32,
    /// Zero-based position among the element children of `path_parent`.
    pub position: u32,
    /// Nearest ancestor that is not transparent for identifier paths.
    pub path_parent: Option<ElementId>,
    /// The element is an anchor or sits inside one.
    pub in_anchor: bool,
    pub status: Status,
    pub preceding: Preceding,
    pub counts: RunningCounts,
    pub snapshot: Option<FeatureSnapshot>,
    keywords: Vec<&'static str>,
    /// Classifier result, once closed.
    pub outcome: Option<Outcome>,
    label: Option<Label>,
    pub child_roles: ChildRoles,
    pub identifier: Option<String>,
    next_position: u32,
}

impl Element {
    pub fn is_structural(&self) -> bool {
        is_structural(&self.tag)
    }

    pub fn label(&self) -> Option<Label> {
        self.label
    }

    pub fn role(&self) -> Option<Role> {
        self.label.map(|l| l.role)
    }

    /// Sets the label. Refused once a label exists or the element is flushed.
    pub fn set_label(&mut self, label: Label) -> bool {
        if self.label.is_some() || self.status == Status::Flushed {
            return false;
        }
        self.label = Some(label);
        true
    }

    /// The element's own `id` when it is usable (present and not blank).
    pub fn explicit_id(&self) -> Option<&str> {
        self.start.get("id").filter(|id| !id.trim().is_empty())
    }

    fn freeze(&mut self, totals: &DocumentTotals) {
        let keywords = std::mem::take(&mut self.keywords);
        self.snapshot = Some(self.counts.finalize(self.depth, &self.preceding, totals, keywords));
    }
}

/// Element arena plus open stack.
#[derive(Debug, Default)]
pub struct Frontier {
    elements: Vec<Element>,
    stack: Vec<ElementId>,
    unflushed: Vec<ElementId>,
    totals: DocumentTotals,
    root_positions: u32,
    id_prefix: String,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frontier that ignores `id` values starting with `prefix` when looking
    /// for keywords, so identifiers synthesized by an earlier run carry no
    /// signal.
    pub fn with_id_prefix(prefix: impl Into<String>) -> Self {
        Self { id_prefix: prefix.into(), ..Self::default() }
    }

    pub fn get(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    pub fn get_mut(&mut self, id: ElementId) -> &mut Element {
        &mut self.elements[id.0]
    }

    pub fn totals(&self) -> &DocumentTotals {
        &self.totals
    }

    /// Open elements, outermost first.
    pub fn open_elements(&self) -> &[ElementId] {
        &self.stack
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Elements in document (open-tag) order.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements.iter().enumerate().map(|(i, e)| (ElementId(i), e))
    }

    /// Whether text at this point belongs to a non-content element.
    pub fn in_non_content(&self) -> bool {
        self.stack.iter().any(|id| NON_CONTENT_TAGS.contains(&self.get(*id).tag.as_str()))
    }

    /// Adds a new open element as a child of the innermost open element.
    ///
    /// The tag is counted in the document totals and in the running counters
    /// of the element itself and every open, unflushed ancestor.
    pub fn open(&mut self, start: StartTag) -> ElementId {
        let id = ElementId(self.elements.len());
        let tag = start.name.to_ascii_lowercase();
        let parent = self.stack.last().copied();
        let structural = is_structural(&tag);
        let significant = significant_index(&tag);

        let depth = match parent {
            _ if structural => 0,
            Some(p) => self.get(p).depth + 1,
            None => 1,
        };
        let in_anchor = tag == "a" || parent.is_some_and(|p| self.get(p).in_anchor);
        let path_parent = parent.and_then(|p| self.path_anchor(p));
        let position = match path_parent {
            _ if PATH_TRANSPARENT_TAGS.contains(&tag.as_str()) => 0,
            Some(pp) => {
                let pp = self.get_mut(pp);
                pp.next_position += 1;
                pp.next_position - 1
            }
            None => {
                self.root_positions += 1;
                self.root_positions - 1
            }
        };

        let keyword_text = ["id", "class", "role"]
            .iter()
            .filter_map(|name| start.get(name).filter(|value| *name != "id" || !self.is_synthesized(value)))
            .collect::<Vec<_>>()
            .join(" ");

        let preceding = self.totals.preceding();
        self.totals.record_tag(significant);

        let mut element = Element {
            tag,
            start,
            parent,
            children: Vec::new(),
            depth,
            position,
            path_parent,
            in_anchor,
            status: Status::Open,
            preceding,
            counts: RunningCounts::new(depth),
            snapshot: None,
            keywords: keyword_hits(&keyword_text),
            outcome: None,
            label: None,
            child_roles: ChildRoles::default(),
            identifier: None,
            next_position: 0,
        };
        let is_img = element.tag == "img";
        element.counts.add_tag(significant, depth, is_img.then_some(false));
        self.elements.push(element);

        if let Some(p) = parent {
            self.get_mut(p).children.push(id);
        }

        let mut past_anchor = false;
        for &ancestor in self.stack.iter().rev() {
            let ancestor = &mut self.elements[ancestor.0];
            past_anchor |= ancestor.tag == "a";
            if ancestor.status == Status::Open {
                ancestor.counts.add_tag(significant, depth, is_img.then_some(past_anchor));
            }
        }

        self.stack.push(id);
        self.unflushed.push(id);
        id
    }

    /// Counts a text node against the document and every open, unflushed
    /// element. Returns the measurement, or `None` for non-content text.
    pub fn text(&mut self, raw: &str) -> Option<TextMeasure> {
        if self.in_non_content() {
            return None;
        }
        let measure = measure_text(raw);
        if measure.content_bytes == 0 {
            return Some(measure);
        }
        self.totals.record_text(measure);

        let mut past_anchor = false;
        for &id in self.stack.iter().rev() {
            let element = &mut self.elements[id.0];
            past_anchor |= element.tag == "a";
            if element.status == Status::Open {
                element.counts.add_text(measure, past_anchor);
            }
        }
        Some(measure)
    }

    /// Stack position of the innermost open element named `tag`.
    pub fn find_open(&self, tag: &str) -> Option<usize> {
        self.stack.iter().rposition(|id| self.get(*id).tag.eq_ignore_ascii_case(tag))
    }

    /// Pops the innermost open element, freezing its snapshot unless a flush
    /// already did.
    pub fn pop(&mut self) -> Option<ElementId> {
        let id = self.stack.pop()?;
        let element = &mut self.elements[id.0];
        if element.status == Status::Open {
            element.status = Status::ClosedPending;
            element.freeze(&self.totals);
        }
        Some(id)
    }

    /// Marks every open and pending element `Flushed`, freezing the
    /// counters of those still open. Returns how many changed status.
    pub fn flush(&mut self) -> usize {
        let ids = std::mem::take(&mut self.unflushed);
        for &id in &ids {
            let element = &mut self.elements[id.0];
            if element.status == Status::Open {
                element.freeze(&self.totals);
            }
            element.status = Status::Flushed;
        }
        ids.len()
    }

    /// Identifier path for an element: the nearest ancestor with a usable
    /// `id` (if any) and the child positions leading down from it.
    pub fn id_path(&self, id: ElementId) -> (Option<&str>, Vec<u32>) {
        let mut positions = vec![self.get(id).position];
        let mut current = self.get(id).path_parent;
        while let Some(ancestor) = current {
            let element = self.get(ancestor);
            if let Some(explicit) = element.explicit_id() {
                positions.reverse();
                return (Some(explicit), positions);
            }
            positions.push(element.position);
            current = element.path_parent;
        }
        positions.reverse();
        (None, positions)
    }

    fn is_synthesized(&self, id: &str) -> bool {
        !self.id_prefix.is_empty() && id.starts_with(&self.id_prefix)
    }

    /// Nearest element at or above `id` that takes part in identifier paths.
    fn path_anchor(&self, id: ElementId) -> Option<ElementId> {
        let mut current = Some(id);
        while let Some(c) = current {
            let element = self.get(c);
            if !PATH_TRANSPARENT_TAGS.contains(&element.tag.as_str()) {
                return Some(c);
            }
            current = element.parent;
        }
        None
    }
}
