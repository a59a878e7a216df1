pub mod annotate;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod features;
pub mod frontier;
pub mod propagate;
pub mod rewrite;
pub mod stats;

pub use annotate::{NO_LABELS_MARKER, RoleIds, SUMMARY_ATTRIBUTE};
pub use classify::{Basis, Label, Outcome, ROLE_ATTRIBUTE, Reason, Role};
#[doc(hidden)]
pub use classify::{ClassifyInput, classify};
pub use config::{ClassOverride, ClassRules, ClassifyConfig, LabelConfig, LabelConfigBuilder};
pub use engine::{LabelEngine, LabelSummary};
pub use error::{Result, RolemarkError};
pub use event::{Attribute, Event, Quote, StartTag};
pub use features::{FeatureSnapshot, TagFeature};
pub use rewrite::{LabelRewriter, LabeledDocument, label_html, label_html_with_config, label_html_with_stats};
pub use stats::{Counter, LabelStats, NoopStats, StatsSink, StatsSnapshot};
