//! Feature aggregation.
//!
//! Counters are maintained incrementally while the tree is still being built:
//! every open element carries [`RunningCounts`] for its subtree, the document
//! carries [`DocumentTotals`] for everything seen so far, and an element's
//! counters are frozen into a [`FeatureSnapshot`] when it stops being open.
//! Nothing here knows about roles.

use regex::{Captures, Regex, RegexSet};
use serde::Serialize;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Tags whose occurrences are tallied individually, in output order.
pub const SIGNIFICANT_TAGS: [&str; 15] = [
    "a", "article", "aside", "body", "div", "footer", "h1", "header", "img", "li", "main", "menu", "nav", "section",
    "ul",
];

/// Per-significant-tag tallies, indexed like [`SIGNIFICANT_TAGS`].
pub type TagCounts = [u64; SIGNIFICANT_TAGS.len()];

/// Attribute substrings recorded as keyword features, in output order.
pub const KEYWORDS: [&str; 15] = [
    "article", "aside", "banner", "body", "breadcrumb", "comment", "content", "foot", "hdr", "head", "main", "menu",
    "nav", "sidebar", "story",
];

static KEYWORD_SET: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new(KEYWORDS.iter().map(|k| format!("(?i){}", regex::escape(k)))).expect("keyword patterns are valid")
});

static CHAR_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,31});")
        .expect("character reference pattern is valid")
});

/// Index of `tag` in [`SIGNIFICANT_TAGS`].
pub fn significant_index(tag: &str) -> Option<usize> {
    SIGNIFICANT_TAGS.binary_search(&tag).ok()
}

/// Keyword features found in the given attribute text (id, class, role).
pub fn keyword_hits(text: &str) -> Vec<&'static str> {
    if text.is_empty() {
        return Vec::new();
    }
    KEYWORD_SET.matches(text).into_iter().map(|i| KEYWORDS[i]).collect()
}

/// `100 * num / den` rounded to two decimals; `0` for an empty denominator.
pub fn percent(num: u64, den: u64) -> f64 {
    if den == 0 {
        return 0.0;
    }
    (num as f64 * 100.0 / den as f64 * 100.0).round() / 100.0
}

/// Byte counts of one text node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextMeasure {
    /// Bytes after trimming surrounding whitespace.
    pub content_bytes: u64,
    /// Bytes of non-whitespace characters.
    pub non_blank_bytes: u64,
}

/// Measures a raw text node.
///
/// Common character references are decoded first so `&amp;` counts as one
/// byte and `&nbsp;` counts as whitespace.
pub fn measure_text(raw: &str) -> TextMeasure {
    let decoded = decode_char_refs(raw);
    let decoded: Cow<'_, str> =
        if decoded.contains('\u{a0}') { Cow::Owned(decoded.replace('\u{a0}', " ")) } else { decoded };
    let trimmed = decoded.trim();

    TextMeasure {
        content_bytes: trimmed.len() as u64,
        non_blank_bytes: trimmed
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.len_utf8() as u64)
            .sum(),
    }
}

fn decode_char_refs(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }
    CHAR_REF.replace_all(raw, |caps: &Captures<'_>| match decode_reference(&caps[1]) {
        Some(c) => c.to_string(),
        None => caps[0].to_string(),
    })
}

fn decode_reference(reference: &str) -> Option<char> {
    let c = if let Some(hex) = reference.strip_prefix("#x").or_else(|| reference.strip_prefix("#X")) {
        char::from_u32(u32::from_str_radix(hex, 16).ok()?)?
    } else if let Some(dec) = reference.strip_prefix('#') {
        char::from_u32(dec.parse().ok()?)?
    } else {
        match reference {
            "nbsp" => ' ',
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            "copy" => '\u{a9}',
            "mdash" => '\u{2014}',
            "ndash" => '\u{2013}',
            "hellip" => '\u{2026}',
            _ => return None,
        }
    };
    Some(if c == '\u{a0}' { ' ' } else { c })
}

/// Document-wide running totals; the denominators for percentages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentTotals {
    pub tag_count: u64,
    pub content_bytes: u64,
    pub non_blank_bytes: u64,
    pub tag_counts: TagCounts,
}

impl DocumentTotals {
    /// Records an opened tag.
    pub fn record_tag(&mut self, significant: Option<usize>) {
        self.tag_count += 1;
        if let Some(i) = significant {
            self.tag_counts[i] += 1;
        }
    }

    /// Records a measured text node.
    pub fn record_text(&mut self, measure: TextMeasure) {
        self.content_bytes += measure.content_bytes;
        self.non_blank_bytes += measure.non_blank_bytes;
    }

    /// The totals as they stand, inherited by a newly opened element.
    pub fn preceding(&self) -> Preceding {
        Preceding {
            tag_count: self.tag_count,
            content_bytes: self.content_bytes,
            non_blank_bytes: self.non_blank_bytes,
            tag_counts: self.tag_counts,
        }
    }

    /// Snapshot of the implicit document-wide root, built from final totals.
    pub fn root_snapshot(&self) -> FeatureSnapshot {
        let tags = SIGNIFICANT_TAGS
            .iter()
            .zip(self.tag_counts.iter())
            .filter(|(_, count)| **count > 0)
            .map(|(tag, count)| TagFeature {
                tag,
                count: *count,
                percent: percent(*count, self.tag_count),
                previous: 0,
            })
            .collect();

        FeatureSnapshot {
            contained_tag_count: self.tag_count,
            contained_tag_percent: percent(self.tag_count, self.tag_count),
            contained_content_bytes: self.content_bytes,
            contained_content_percent: percent(self.content_bytes, self.content_bytes),
            contained_non_blank_bytes: self.non_blank_bytes,
            contained_non_blank_percent: percent(self.non_blank_bytes, self.non_blank_bytes),
            tags,
            ..Default::default()
        }
    }
}

/// Document totals captured when an element opened.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preceding {
    pub tag_count: u64,
    pub content_bytes: u64,
    pub non_blank_bytes: u64,
    pub tag_counts: TagCounts,
}

/// Counters accumulated for an open element's subtree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningCounts {
    pub tag_count: u64,
    pub max_depth: u32,
    pub content_bytes: u64,
    pub non_blank_bytes: u64,
    pub a_content_bytes: u64,
    pub non_a_content_bytes: u64,
    pub a_img_tags: u64,
    pub non_a_img_tags: u64,
    pub tag_counts: TagCounts,
}

impl RunningCounts {
    /// Fresh counters for an element at `depth`.
    pub fn new(depth: u32) -> Self {
        Self { max_depth: depth, ..Default::default() }
    }

    /// Records a tag opened inside this subtree (or the element itself).
    ///
    /// `img_in_anchor` is `Some` for images and says whether the image sits
    /// in an anchor belonging to this subtree.
    pub fn add_tag(&mut self, significant: Option<usize>, depth: u32, img_in_anchor: Option<bool>) {
        self.tag_count += 1;
        self.max_depth = self.max_depth.max(depth);
        if let Some(i) = significant {
            self.tag_counts[i] += 1;
        }
        match img_in_anchor {
            Some(true) => self.a_img_tags += 1,
            Some(false) => self.non_a_img_tags += 1,
            None => {}
        }
    }

    /// Records text inside this subtree.
    pub fn add_text(&mut self, measure: TextMeasure, in_anchor: bool) {
        self.content_bytes += measure.content_bytes;
        self.non_blank_bytes += measure.non_blank_bytes;
        if in_anchor {
            self.a_content_bytes += measure.content_bytes;
        } else {
            self.non_a_content_bytes += measure.content_bytes;
        }
    }

    /// Freezes the counters into a snapshot.
    ///
    /// Preceding and contained percentages use the document totals as they
    /// stand at this moment; local percentages use this element's own counts.
    pub fn finalize(
        &self, depth: u32, preceding: &Preceding, totals: &DocumentTotals, keywords: Vec<&'static str>,
    ) -> FeatureSnapshot {
        let tags = SIGNIFICANT_TAGS
            .iter()
            .enumerate()
            .filter(|(i, _)| self.tag_counts[*i] > 0 || preceding.tag_counts[*i] > 0)
            .map(|(i, tag)| TagFeature {
                tag,
                count: self.tag_counts[i],
                percent: percent(self.tag_counts[i], self.tag_count),
                previous: preceding.tag_counts[i],
            })
            .collect();

        FeatureSnapshot {
            element_tag_depth: depth,
            previous_tag_count: preceding.tag_count,
            previous_tag_percent: percent(preceding.tag_count, totals.tag_count),
            previous_content_bytes: preceding.content_bytes,
            previous_content_percent: percent(preceding.content_bytes, totals.content_bytes),
            previous_non_blank_bytes: preceding.non_blank_bytes,
            previous_non_blank_percent: percent(preceding.non_blank_bytes, totals.non_blank_bytes),
            contained_tag_depth: self.max_depth,
            contained_tag_relative_depth: self.max_depth.saturating_sub(depth),
            contained_tag_count: self.tag_count,
            contained_tag_percent: percent(self.tag_count, totals.tag_count),
            contained_content_bytes: self.content_bytes,
            contained_content_percent: percent(self.content_bytes, totals.content_bytes),
            contained_non_blank_bytes: self.non_blank_bytes,
            contained_non_blank_percent: percent(self.non_blank_bytes, totals.non_blank_bytes),
            contained_a_content_bytes: self.a_content_bytes,
            contained_a_content_local_percent: percent(self.a_content_bytes, self.content_bytes),
            contained_non_a_content_bytes: self.non_a_content_bytes,
            contained_a_img_tags: self.a_img_tags,
            contained_a_img_local_percent: percent(self.a_img_tags, self.a_img_tags + self.non_a_img_tags),
            contained_non_a_img_tags: self.non_a_img_tags,
            keywords,
            tags,
        }
    }
}

/// Figures for one significant tag within a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagFeature {
    pub tag: &'static str,
    /// Occurrences inside the subtree, the element itself included.
    pub count: u64,
    /// Share of the subtree's tags.
    pub percent: f64,
    /// Occurrences in the document before the element opened.
    pub previous: u64,
}

/// A value in the debug rendering of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue {
    Count(u64),
    Percent(f64),
}

impl FeatureValue {
    fn is_zero(self) -> bool {
        match self {
            FeatureValue::Count(n) => n == 0,
            FeatureValue::Percent(p) => p == 0.0,
        }
    }
}

impl std::fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureValue::Count(n) => write!(f, "{}", n),
            FeatureValue::Percent(p) => write!(f, "{:.2}", p),
        }
    }
}

/// Frozen structural and content statistics of one element.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureSnapshot {
    pub element_tag_depth: u32,
    pub previous_tag_count: u64,
    pub previous_tag_percent: f64,
    pub previous_content_bytes: u64,
    pub previous_content_percent: f64,
    pub previous_non_blank_bytes: u64,
    pub previous_non_blank_percent: f64,
    pub contained_tag_depth: u32,
    pub contained_tag_relative_depth: u32,
    pub contained_tag_count: u64,
    pub contained_tag_percent: f64,
    pub contained_content_bytes: u64,
    pub contained_content_percent: f64,
    pub contained_non_blank_bytes: u64,
    pub contained_non_blank_percent: f64,
    pub contained_a_content_bytes: u64,
    pub contained_a_content_local_percent: f64,
    pub contained_non_a_content_bytes: u64,
    pub contained_a_img_tags: u64,
    pub contained_a_img_local_percent: f64,
    pub contained_non_a_img_tags: u64,
    pub keywords: Vec<&'static str>,
    pub tags: Vec<TagFeature>,
}

impl FeatureSnapshot {
    /// Occurrences of a significant tag inside the subtree.
    pub fn tag_count(&self, tag: &str) -> u64 {
        self.tags.iter().find(|t| t.tag == tag).map_or(0, |t| t.count)
    }

    /// Images inside the subtree, linked or not.
    pub fn images(&self) -> u64 {
        self.contained_a_img_tags + self.contained_non_a_img_tags
    }

    /// Named scalar features in debug order, zero values skipped.
    pub fn named_values(&self) -> Vec<(&'static str, FeatureValue)> {
        use FeatureValue::{Count, Percent};

        let all = [
            ("ElementTagDepth", Count(self.element_tag_depth as u64)),
            ("PreviousTagCount", Count(self.previous_tag_count)),
            ("PreviousTagPercent", Percent(self.previous_tag_percent)),
            ("PreviousContentBytes", Count(self.previous_content_bytes)),
            ("PreviousContentPercent", Percent(self.previous_content_percent)),
            ("PreviousNonBlankBytes", Count(self.previous_non_blank_bytes)),
            ("PreviousNonBlankPercent", Percent(self.previous_non_blank_percent)),
            ("ContainedTagDepth", Count(self.contained_tag_depth as u64)),
            ("ContainedTagRelativeDepth", Count(self.contained_tag_relative_depth as u64)),
            ("ContainedTagCount", Count(self.contained_tag_count)),
            ("ContainedTagPercent", Percent(self.contained_tag_percent)),
            ("ContainedContentBytes", Count(self.contained_content_bytes)),
            ("ContainedContentPercent", Percent(self.contained_content_percent)),
            ("ContainedNonBlankBytes", Count(self.contained_non_blank_bytes)),
            ("ContainedNonBlankPercent", Percent(self.contained_non_blank_percent)),
            ("ContainedAContentBytes", Count(self.contained_a_content_bytes)),
            ("ContainedAContentLocalPercent", Percent(self.contained_a_content_local_percent)),
            ("ContainedNonAContentBytes", Count(self.contained_non_a_content_bytes)),
            ("ContainedAImgTag", Count(self.contained_a_img_tags)),
            ("ContainedAImgLocalPercent", Percent(self.contained_a_img_local_percent)),
            ("ContainedNonAImgTag", Count(self.contained_non_a_img_tags)),
        ];
        all.into_iter().filter(|(_, v)| !v.is_zero()).collect()
    }
}
