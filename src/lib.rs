//! Search facet composer: active filters and period comparisons turned into
//! facet labels and a backend query.

pub mod command;
pub mod composer;
pub mod config;
pub mod domain;
pub mod messaging;
pub mod period;
pub mod sql_compiler;

pub use composer::{ComposerError, Facet, FilterValue, Query, QueryComposer, TimeRange};
pub use config::{ComparisonMode, FieldDef, FieldType, SearchConfig};
pub use period::{ComparisonKind, DateOption, Granularity, Period};
