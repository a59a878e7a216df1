use crate::config::{ClassOverride, ClassRules, ClassifyConfig};
use crate::event::StartTag;
use crate::features::FeatureSnapshot;
use crate::stats::Counter;

/// Attribute carrying an element's role, both on input and output.
pub const ROLE_ATTRIBUTE: &str = "data-mobile-role";

/// Semantic layout role of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Navigational,
    Header,
    Content,
    Marginal,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Navigational, Role::Header, Role::Content, Role::Marginal];

    /// Attribute value for the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Navigational => "navigational",
            Role::Header => "header",
            Role::Content => "content",
            Role::Marginal => "marginal",
        }
    }

    /// Parses an attribute value; surrounding whitespace and case are ignored.
    pub fn parse(value: &str) -> Option<Role> {
        let value = value.trim();
        Role::ALL.into_iter().find(|r| r.as_str().eq_ignore_ascii_case(value))
    }

    /// Statistics counter incremented when the role is inferred.
    pub fn counter(self) -> Counter {
        match self {
            Role::Navigational => Counter::NavigationalRoles,
            Role::Header => Counter::HeaderRoles,
            Role::Content => Counter::ContentRoles,
            Role::Marginal => Counter::MarginalRoles,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What decided an element's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Basis {
    /// Set by the page author through the role attribute.
    Explicit,
    /// Forced by a configured class override.
    Override,
    /// HTML5 tag semantics.
    Prior,
    /// ARIA landmark `role` attribute.
    Landmark,
    /// Keyword and shape votes.
    Signals,
    /// Inherited from children that all agree.
    Unanimity,
    /// Bubbled up from marginal children.
    MarginalChildren,
}

impl Basis {
    pub fn is_propagated(self) -> bool {
        matches!(self, Basis::Unanimity | Basis::MarginalChildren)
    }
}

/// A role together with its basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    pub role: Role,
    pub basis: Basis,
}

impl Label {
    pub fn new(role: Role, basis: Basis) -> Self {
        Self { role, basis }
    }
}

/// Why an element was left without a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// A class override excludes it; propagation is blocked too.
    Excluded,
    /// It is, or sits inside, an anchor with no anchor nested below it.
    InsideAnchor,
    /// Its tag never carries a role, classified or inherited.
    Ineligible,
    /// No text and no image.
    TooSmall,
    /// Nothing pointed at any role.
    NoSignal,
    /// Signals pointed at more than one role equally.
    Ambiguous,
}

/// Classifier result for one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Labeled(Label),
    Unlabeled(Reason),
}

impl Outcome {
    pub fn label(self) -> Option<Label> {
        match self {
            Outcome::Labeled(label) => Some(label),
            Outcome::Unlabeled(_) => None,
        }
    }

    pub fn is_ambiguous(self) -> bool {
        self == Outcome::Unlabeled(Reason::Ambiguous)
    }

    /// Whether children's roles may never be inherited by the element.
    pub fn blocks_propagation(self) -> bool {
        matches!(self, Outcome::Unlabeled(Reason::Excluded | Reason::InsideAnchor | Reason::Ineligible))
    }
}

/// Tags that may receive a role from the classifier itself.
const ELIGIBLE_TAGS: &[&str] = &[
    "article", "aside", "center", "div", "footer", "form", "header", "main", "menu", "nav", "ol", "section", "table",
    "td", "ul",
];

/// Eligible tags without HTML5 semantics; only these take link-list votes.
const GENERIC_TAGS: &[&str] = &["center", "div", "form", "ol", "table", "td", "ul"];

/// Tags that take content-block votes.
const BLOCK_TAGS: &[&str] = &["center", "div", "table", "td"];

pub fn is_eligible(tag: &str) -> bool {
    ELIGIBLE_TAGS.contains(&tag)
}

/// Role implied by an HTML5 sectioning tag:
/// - NAV, MENU: navigational
/// - HEADER: header
/// - MAIN, ARTICLE, SECTION: content
/// - ASIDE, FOOTER: marginal
pub fn tag_prior(tag: &str) -> Option<Role> {
    match tag {
        "nav" | "menu" => Some(Role::Navigational),
        "header" => Some(Role::Header),
        "main" | "article" | "section" => Some(Role::Content),
        "aside" | "footer" => Some(Role::Marginal),
        _ => None,
    }
}

/// Role implied by an ARIA landmark (`role` attribute, exact token match).
pub fn landmark_role(role_attr: &str) -> Option<Role> {
    role_attr
        .split_ascii_whitespace()
        .find_map(|token| match token.to_ascii_lowercase().as_str() {
            "navigation" => Some(Role::Navigational),
            "banner" => Some(Role::Header),
            "main" => Some(Role::Content),
            "contentinfo" | "complementary" => Some(Role::Marginal),
            _ => None,
        })
}

/// Role a keyword feature votes for.
pub fn keyword_role(keyword: &str) -> Option<Role> {
    match keyword {
        "nav" | "menu" | "breadcrumb" => Some(Role::Navigational),
        "head" | "hdr" | "banner" => Some(Role::Header),
        "content" | "main" | "article" | "body" | "story" => Some(Role::Content),
        "foot" | "sidebar" | "aside" | "comment" => Some(Role::Marginal),
        _ => None,
    }
}

/// Everything the classifier looks at for one closed element.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyInput<'a> {
    /// Lowercase tag name.
    pub tag: &'a str,
    pub start: &'a StartTag,
    pub snapshot: &'a FeatureSnapshot,
    /// The element is an anchor or has an anchor ancestor.
    pub in_anchor: bool,
    /// Some child already carries a role.
    pub has_labeled_children: bool,
}

impl ClassifyInput<'_> {
    fn is_tiny(&self) -> bool {
        self.snapshot.contained_non_blank_bytes == 0 && self.snapshot.images() == 0
    }

    fn nested_anchors(&self) -> u64 {
        self.snapshot.tag_count("a").saturating_sub(u64::from(self.tag == "a"))
    }
}

/// Votes per role, indexed like [`Role::ALL`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Votes([u32; 4]);

impl Votes {
    pub fn add(&mut self, role: Role) {
        self.0[role.index()] += 1;
    }

    pub fn get(&self, role: Role) -> u32 {
        self.0[role.index()]
    }

    /// The unique best role, `Err(Ambiguous)` on a tie, `Err(NoSignal)` with no votes.
    pub fn winner(&self) -> Result<Role, Reason> {
        let max = self.0.iter().copied().max().unwrap_or(0);
        if max == 0 {
            return Err(Reason::NoSignal);
        }
        let mut leaders = Role::ALL.into_iter().filter(|r| self.get(*r) == max);
        match (leaders.next(), leaders.next()) {
            (Some(role), None) => Ok(role),
            _ => Err(Reason::Ambiguous),
        }
    }
}

/// Collects signal votes for an element:
/// - each keyword hit in `id`/`class`/`role` votes for its role
/// - a generic container that is mostly links votes navigational
/// - a large block of text with few links votes content
///
/// Shape votes only apply to leaf containers, those without labeled children.
pub fn collect_votes(input: &ClassifyInput<'_>, config: &ClassifyConfig) -> Votes {
    let mut votes = Votes::default();
    for role in input.snapshot.keywords.iter().filter_map(|k| keyword_role(k)) {
        votes.add(role);
    }
    if input.has_labeled_children {
        return votes;
    }

    let snapshot = input.snapshot;
    let link_percent = snapshot.contained_a_content_local_percent;
    if GENERIC_TAGS.contains(&input.tag)
        && snapshot.tag_count("a") >= config.min_nav_links
        && link_percent >= config.min_nav_link_percent
    {
        votes.add(Role::Navigational);
    }
    if BLOCK_TAGS.contains(&input.tag)
        && snapshot.contained_non_blank_bytes >= config.min_content_bytes
        && link_percent <= config.max_content_link_percent
    {
        votes.add(Role::Content);
    }
    votes
}

/// Decides an element's own role. The first matching rule wins:
/// 1. a valid explicit role attribute
/// 2. a class override (the rules are empty when overrides are off)
/// 3. anchor suppression
/// 4. tag eligibility
/// 5. ARIA landmarks, then HTML5 tag priors
/// 6. signal votes
///
/// Rules 5 and 6 leave tiny elements unlabeled.
pub fn classify(input: &ClassifyInput<'_>, config: &ClassifyConfig, rules: &ClassRules) -> Outcome {
    if let Some(role) = input.start.get(ROLE_ATTRIBUTE).and_then(Role::parse) {
        return Outcome::Labeled(Label::new(role, Basis::Explicit));
    }

    match input.start.get("class").and_then(|class| rules.lookup(class)) {
        Some(ClassOverride::Include) => return Outcome::Labeled(Label::new(Role::Navigational, Basis::Override)),
        Some(ClassOverride::Exclude) => return Outcome::Unlabeled(Reason::Excluded),
        None => {}
    }

    if input.in_anchor && input.nested_anchors() == 0 {
        return Outcome::Unlabeled(Reason::InsideAnchor);
    }

    if !is_eligible(input.tag) {
        return Outcome::Unlabeled(Reason::Ineligible);
    }

    let decided = input
        .start
        .get("role")
        .and_then(landmark_role)
        .map(|role| Label::new(role, Basis::Landmark))
        .or_else(|| tag_prior(input.tag).map(|role| Label::new(role, Basis::Prior)));

    let label = match decided {
        Some(label) => label,
        None => match collect_votes(input, config).winner() {
            Ok(role) => Label::new(role, Basis::Signals),
            Err(reason) => return Outcome::Unlabeled(reason),
        },
    };

    if input.is_tiny() { Outcome::Unlabeled(Reason::TooSmall) } else { Outcome::Labeled(label) }
}
