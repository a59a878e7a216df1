//! Output helpers: identifiers, start-tag rendering, debug comments and the
//! role summary block.

use crate::classify::{Basis, Label, Outcome, ROLE_ATTRIBUTE, Reason, Role};
use crate::event::{Attribute, StartTag};
use crate::features::FeatureSnapshot;
use crate::frontier::ElementId;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt::Write;

/// Attribute marking a generated summary block.
pub const SUMMARY_ATTRIBUTE: &str = "data-mobile-role-summary";

/// Comment text emitted when a document has no labeled element.
pub const NO_LABELS_MARKER: &str = "No elements labeled for mobile layout";

/// Identifiers handed out within one document.
#[derive(Debug, Default)]
pub struct IdRegistry {
    used: HashSet<String>,
    synthesized: HashMap<String, ElementId>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an identifier present in the input.
    ///
    /// Returns the element that was already handed the same identifier by
    /// [`synthesize`](Self::synthesize), which then needs a new one.
    pub fn reserve(&mut self, id: &str) -> Option<ElementId> {
        self.used.insert(id.to_string());
        self.synthesized.remove(id)
    }

    /// Builds `<prefix>[<base>-]<p1>-<p2>...` for `owner`, suffixed with `~n`
    /// if taken.
    pub fn synthesize(&mut self, owner: ElementId, prefix: &str, base: Option<&str>, path: &[u32]) -> String {
        let mut id = String::from(prefix);
        if let Some(base) = base {
            id.push_str(base);
            id.push('-');
        }
        let path = path.iter().map(u32::to_string).collect::<Vec<_>>().join("-");
        id.push_str(&path);

        if self.used.contains(&id) {
            let mut n = 1;
            while self.used.contains(&format!("{id}~{n}")) {
                n += 1;
            }
            id = format!("{id}~{n}");
        }
        self.used.insert(id.clone());
        self.synthesized.insert(id.clone(), owner);
        id
    }
}

/// Renders a start tag, adding the identifier and role attribute if given.
///
/// A blank `id` attribute is replaced in place; otherwise the identifier is
/// appended. Attribute values are re-quoted with double quotes except where
/// the source used another style.
pub fn render_start_tag(start: &StartTag, id: Option<&str>, role: Option<Role>) -> String {
    let mut out = String::with_capacity(start.name.len() + 2 + start.attributes.len() * 16);
    out.push('<');
    out.push_str(&start.name);

    let mut id_written = false;
    for attribute in &start.attributes {
        match id {
            Some(id) if attribute.is("id") && !id_written => {
                Attribute::new(attribute.name.clone(), id).write_to(&mut out);
                id_written = true;
            }
            _ => attribute.write_to(&mut out),
        }
    }
    if let Some(id) = id.filter(|_| !id_written) {
        Attribute::new("id", id).write_to(&mut out);
    }
    if let Some(role) = role {
        Attribute::new(ROLE_ATTRIBUTE, role.as_str()).write_to(&mut out);
    }

    if start.self_closing {
        out.push_str(" />");
    } else {
        out.push('>');
    }
    out
}

/// Renders an end tag.
pub fn render_end_tag(name: &str) -> String {
    format!("</{name}>")
}

/// Makes text safe inside `<!-- -->`.
pub fn defang_comment(text: &str) -> String {
    let mut out = text.to_string();
    while out.contains("--") {
        out = out.replace("--", "- -");
    }
    if out.ends_with('-') {
        out.push(' ');
    }
    out
}

/// Escapes an identifier as the body of a single-quoted script string.
pub fn escape_js_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            '<' if chars.peek().is_some_and(|n| *n == '/' || *n == '!') => out.push_str("<\\"),
            _ => out.push(c),
        }
    }
    out
}

/// Whether an input comment was produced by a previous labeling run.
pub fn is_generated_comment(text: &str) -> bool {
    text == NO_LABELS_MARKER || (text.starts_with("id: ") && text.contains("ElementTagDepth: "))
}

/// Identifiers of labeled elements, per role, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleIds {
    pub header: Vec<String>,
    pub navigational: Vec<String>,
    pub content: Vec<String>,
    pub marginal: Vec<String>,
}

impl RoleIds {
    pub fn push(&mut self, role: Role, id: String) {
        self.list_mut(role).push(id);
    }

    pub fn get(&self, role: Role) -> &[String] {
        match role {
            Role::Header => &self.header,
            Role::Navigational => &self.navigational,
            Role::Content => &self.content,
            Role::Marginal => &self.marginal,
        }
    }

    fn list_mut(&mut self, role: Role) -> &mut Vec<String> {
        match role {
            Role::Header => &mut self.header,
            Role::Navigational => &mut self.navigational,
            Role::Content => &mut self.content,
            Role::Marginal => &mut self.marginal,
        }
    }

    pub fn is_empty(&self) -> bool {
        Role::ALL.iter().all(|r| self.get(*r).is_empty())
    }

    pub fn len(&self) -> usize {
        Role::ALL.iter().map(|r| self.get(*r).len()).sum()
    }
}

/// Summary script listing the identifiers per role, or the marker comment
/// when nothing was labeled.
pub fn render_summary(ids: &RoleIds) -> String {
    if ids.is_empty() {
        return format!("<!--{NO_LABELS_MARKER}-->");
    }

    let mut out = format!("<script type=\"text/javascript\" {SUMMARY_ATTRIBUTE}>");
    for (name, role) in [
        ("mobileHeaderIds", Role::Header),
        ("mobileNavigationalIds", Role::Navigational),
        ("mobileContentIds", Role::Content),
        ("mobileMarginalIds", Role::Marginal),
    ] {
        let list = ids.get(role);
        if list.is_empty() {
            continue;
        }
        let quoted: Vec<String> = list.iter().map(|id| format!("'{}'", escape_js_string(id))).collect();
        let _ = writeln!(out, "{name}=[{}];", quoted.join(","));
    }
    out.push_str("</script>");
    out
}

/// Debug comment describing an analyzed element.
pub fn debug_comment(
    id: Option<&str>, label: Option<Label>, outcome: Option<Outcome>, snapshot: &FeatureSnapshot,
    parent_role: Option<Role>,
) -> String {
    let mut parts = Vec::new();
    if let Some(id) = id {
        parts.push(format!("id: {id}"));
    }
    if let Some(label) = label {
        parts.push(format!("role: {}", label.role));
    }
    for (name, value) in snapshot.named_values() {
        parts.push(format!("{name}: {value}"));
    }
    for keyword in &snapshot.keywords {
        parts.push(format!("{keyword}: 1"));
    }
    for tag in &snapshot.tags {
        if tag.count > 0 {
            parts.push(format!("{} count: {}", tag.tag, tag.count));
            parts.push(format!("{} percent: {:.2}", tag.tag, tag.percent));
        }
        if tag.previous > 0 {
            parts.push(format!("{} previous: {}", tag.tag, tag.previous));
        }
    }
    match label.map(|l| l.basis) {
        Some(Basis::Unanimity) => parts.push("inherited from children".to_string()),
        Some(Basis::MarginalChildren) => parts.push("marginal children".to_string()),
        Some(Basis::Override) => parts.push("class override".to_string()),
        _ => {}
    }
    if outcome == Some(Outcome::Unlabeled(Reason::Ambiguous)) {
        parts.push("outcome: ambiguous".to_string());
    }
    if let Some(role) = parent_role {
        parts.push(format!("parent role is {role}"));
    }
    format!("<!--{}-->", defang_comment(&parts.join(", ")))
}
