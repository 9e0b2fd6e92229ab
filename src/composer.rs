//! Query composer: active filters and comparisons, their facets and the exported query.
//!
//! Facets are listed filters first (one per field group, in order of first
//! insertion) followed by comparisons (in activation order). A comparison only
//! lives as long as the date filter it compares; every mutation that changes a
//! date filter re-checks that link.

use crate::config::{ComparisonMode, FieldDef, SearchConfig};
use crate::domain::{Domain, DomainValue, Operator};
use crate::period::{describe, ComparisonKind, DateOption, DateSelection, Granularity, Period};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, warn};

/// Separator between the parts of a grouped facet
pub const FACET_SEPARATOR: &str = "or";

/// Recoverable invalid-state conditions; the composer is left unchanged
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComposerError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("value does not fit field '{field}' of type {expected}")]
    ValueTypeMismatch { field: String, expected: String },
    #[error("invalid date option for field '{0}'")]
    InvalidDateOption(String),
    #[error("no active date filter on '{0}'")]
    NoActiveDateFilter(String),
    #[error("comparison is not enabled for this search")]
    ComparisonDisabled,
    #[error("facet index {index} out of range ({len} facets)")]
    FacetOutOfRange { index: usize, len: usize },
}

/// A value chosen for a filter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Month { year: i32, month: u32 },
    Quarter { year: i32, quarter: u32 },
    Year(i32),
    Text(String),
    Number(f64),
}

impl FilterValue {
    fn as_period(&self) -> Option<Period> {
        match *self {
            FilterValue::Month { year, month } => Some(Period::Month { year, month }),
            FilterValue::Quarter { year, quarter } => Some(Period::Quarter { year, quarter }),
            FilterValue::Year(year) => Some(Period::Year(year)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Selection {
    Date(DateSelection),
    Values(Vec<FilterValue>),
}

#[derive(Debug, Clone)]
struct ActiveFilter {
    field: String,
    selection: Selection,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveComparison<'a> {
    field: &'a str,
    kind: ComparisonKind,
}

/// A facet as displayed by the host
#[derive(Debug, Clone, PartialEq)]
pub enum Facet {
    /// Filters of one group, OR-combined
    Filters { group: String, parts: Vec<String> },
    Comparison { field: String, kind: ComparisonKind, label: String },
}

impl Facet {
    pub fn text(&self) -> String {
        match self {
            Facet::Filters { parts, .. } => parts.join(FACET_SEPARATOR),
            Facet::Comparison { label, .. } => label.clone(),
        }
    }
}

/// Concrete ranges of one active comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub field_name: String,
    pub comparison_id: ComparisonKind,
    pub range: Domain,
    pub range_description: String,
    pub comparison_range: Domain,
    pub comparison_range_description: String,
}

/// What the host hands to the search backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub domain: Domain,
    #[serde(rename = "timeRanges", skip_serializing_if = "Option::is_none")]
    pub time_ranges: Option<Vec<TimeRange>>,
}

pub struct QueryComposer {
    config: SearchConfig,
    /// Reference date for default years of month/quarter options
    today: NaiveDate,
    filters: Vec<ActiveFilter>,
    comparisons: Vec<(String, ComparisonKind)>,
}

impl QueryComposer {
    pub fn new(config: SearchConfig) -> Self {
        Self::with_today(config, Local::now().date_naive())
    }

    pub fn with_today(config: SearchConfig, today: NaiveDate) -> Self {
        Self {
            config,
            today,
            filters: Vec::new(),
            comparisons: Vec::new(),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn field_def(&self, field: &str) -> Result<&FieldDef, ComposerError> {
        self.config
            .field(field)
            .ok_or_else(|| ComposerError::UnknownField(field.to_string()))
    }

    fn filter_index(&self, field: &str) -> Option<usize> {
        self.filters.iter().position(|f| f.field == field)
    }

    fn date_selection(&self, field: &str) -> Option<&DateSelection> {
        self.filters.iter().find_map(|f| match &f.selection {
            Selection::Date(selection) if f.field == field => Some(selection),
            _ => None,
        })
    }

    /// Add a value to a field's filter, OR-combining with values already selected
    pub fn add_filter(&mut self, field: &str, value: FilterValue) -> Result<(), ComposerError> {
        let field_type = self.field_def(field)?.field_type;
        let mismatch = || ComposerError::ValueTypeMismatch {
            field: field.to_string(),
            expected: format!("{:?}", field_type).to_lowercase(),
        };

        let selection = match (&value, value.as_period()) {
            (_, Some(period)) => {
                if !field_type.is_date() {
                    return Err(mismatch());
                }
                if period.range().is_none() {
                    return Err(ComposerError::InvalidDateOption(field.to_string()));
                }
                let mut selection = DateSelection::default();
                selection.insert_period(period);
                Selection::Date(selection)
            }
            (FilterValue::Text(_), None) if !field_type.is_date() && !field_type.is_numeric() => {
                Selection::Values(vec![value.clone()])
            }
            (FilterValue::Number(n), None) if field_type.is_numeric() && n.is_finite() => {
                Selection::Values(vec![value.clone()])
            }
            _ => return Err(mismatch()),
        };

        debug!(field, ?value, "add filter");
        match self.filter_index(field) {
            None => self.filters.push(ActiveFilter {
                field: field.to_string(),
                selection,
            }),
            Some(index) => {
                let before = self.date_selection(field).map(DateSelection::units);
                match (&mut self.filters[index].selection, selection) {
                    (Selection::Date(current), Selection::Date(_)) => {
                        if let Some(period) = value.as_period() {
                            current.insert_period(period);
                        }
                    }
                    (Selection::Values(current), Selection::Values(_)) => {
                        if !current.contains(&value) {
                            current.push(value);
                        }
                    }
                    _ => return Err(mismatch()),
                }
                self.check_comparison(field, before);
            }
        }
        Ok(())
    }

    /// Toggle one option of a date filter the way the filter menu does
    pub fn toggle_date_option(&mut self, field: &str, option: DateOption) -> Result<(), ComposerError> {
        let def = self.field_def(field)?;
        if !def.field_type.is_date() {
            return Err(ComposerError::ValueTypeMismatch {
                field: field.to_string(),
                expected: "date".to_string(),
            });
        }
        if !option.is_valid() {
            return Err(ComposerError::InvalidDateOption(field.to_string()));
        }

        let before = self.date_selection(field).map(DateSelection::units);
        let today = self.today;
        let index = match self.filter_index(field) {
            Some(index) => index,
            None => {
                self.filters.push(ActiveFilter {
                    field: field.to_string(),
                    selection: Selection::Date(DateSelection::default()),
                });
                self.filters.len() - 1
            }
        };

        if let Selection::Date(selection) = &mut self.filters[index].selection {
            if selection.contains(option) {
                selection.remove(option);
            } else {
                if selection.menu_is_empty() {
                    selection.insert(DateOption::Year(option.default_year(today)));
                }
                selection.insert(option);
            }
            debug!(field, ?option, periods = selection.periods().len(), "toggle date option");
            if selection.is_empty() {
                self.filters.remove(index);
            }
        }

        self.check_comparison(field, before);
        Ok(())
    }

    /// Drop the comparison of `field` when its filter disappeared or the units
    /// its periods are shifted by changed
    fn check_comparison(&mut self, field: &str, before: Option<BTreeSet<Granularity>>) {
        let after = self.date_selection(field).map(DateSelection::units);
        if after.is_some() && after == before {
            return;
        }
        let count = self.comparisons.len();
        self.comparisons.retain(|(f, _)| f != field);
        if self.comparisons.len() != count {
            warn!(field, "comparison dropped, its date filter changed");
        }
    }

    /// Compare a date filter with a shifted period
    pub fn add_comparison(&mut self, field: &str, kind: ComparisonKind) -> Result<(), ComposerError> {
        if !self.config.comparison_enabled() {
            return Err(ComposerError::ComparisonDisabled);
        }
        if self.date_selection(field).is_none() {
            return Err(ComposerError::NoActiveDateFilter(field.to_string()));
        }

        debug!(field, ?kind, "add comparison");
        match self.config.comparison_mode {
            ComparisonMode::Exclusive => {
                self.comparisons.clear();
                self.comparisons.push((field.to_string(), kind));
            }
            ComparisonMode::PerField => match self.comparisons.iter_mut().find(|(f, _)| f == field) {
                Some(existing) => existing.1 = kind,
                None => self.comparisons.push((field.to_string(), kind)),
            },
        }
        Ok(())
    }

    /// Group keys of active filters, in order of first insertion
    fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for filter in &self.filters {
            let group = self.config.group_of(&filter.field);
            if !groups.contains(&group) {
                groups.push(group);
            }
        }
        groups
    }

    fn active_comparisons(&self) -> impl Iterator<Item = ActiveComparison<'_>> {
        self.comparisons.iter().map(|(field, kind)| ActiveComparison {
            field: field.as_str(),
            kind: *kind,
        })
    }

    /// Remove the facet at a display position
    pub fn remove_facet(&mut self, index: usize) -> Result<(), ComposerError> {
        let groups: Vec<String> = self.groups().into_iter().map(str::to_string).collect();
        let len = groups.len() + self.comparisons.len();
        if index >= len {
            return Err(ComposerError::FacetOutOfRange { index, len });
        }

        if index >= groups.len() {
            let (field, kind) = self.comparisons.remove(index - groups.len());
            debug!(field = %field, ?kind, "remove comparison facet");
            return Ok(());
        }

        let group = &groups[index];
        let removed: Vec<String> = self
            .filters
            .iter()
            .filter(|f| self.config.group_of(&f.field) == group.as_str())
            .map(|f| f.field.clone())
            .collect();
        debug!(group = %group, fields = ?removed, "remove filter facet");
        self.filters.retain(|f| !removed.contains(&f.field));
        self.comparisons.retain(|(field, _)| !removed.contains(field));
        Ok(())
    }

    fn label<'a>(&'a self, field: &'a str) -> &'a str {
        self.config.field(field).map_or(field, |def| def.label.as_str())
    }

    fn filter_parts(&self, filter: &ActiveFilter) -> Vec<String> {
        let label = self.label(&filter.field);
        match &filter.selection {
            Selection::Date(selection) => {
                vec![format!("{}: {}", label, describe(&selection.periods()))]
            }
            Selection::Values(values) => values
                .iter()
                .map(|value| match value {
                    FilterValue::Text(s) => format!("{}: {}", label, s),
                    FilterValue::Number(n) => format!("{}: {}", label, n),
                    other => format!("{}: {:?}", label, other),
                })
                .collect(),
        }
    }

    pub fn facets(&self) -> Vec<Facet> {
        let mut facets: Vec<Facet> = self
            .groups()
            .into_iter()
            .map(|group| Facet::Filters {
                group: group.to_string(),
                parts: self
                    .filters
                    .iter()
                    .filter(|f| self.config.group_of(&f.field) == group)
                    .flat_map(|f| self.filter_parts(f))
                    .collect(),
            })
            .collect();

        facets.extend(self.active_comparisons().map(|c| Facet::Comparison {
            field: c.field.to_string(),
            kind: c.kind,
            label: format!("{}: {}", self.label(c.field), c.kind.label()),
        }));
        facets
    }

    pub fn facet_texts(&self) -> Vec<String> {
        self.facets().iter().map(Facet::text).collect()
    }

    /// Labels offered by the comparison menu for the active date filters
    pub fn comparison_menu_items(&self) -> Vec<String> {
        if !self.config.comparison_enabled() {
            return Vec::new();
        }
        self.filters
            .iter()
            .filter(|f| matches!(f.selection, Selection::Date(_)))
            .flat_map(|f| {
                let label = self.label(&f.field);
                ComparisonKind::ALL
                    .into_iter()
                    .map(move |kind| format!("{}: {}", label, kind.label()))
            })
            .collect()
    }

    /// `None` when no period resolves to a calendar range
    fn periods_domain(field: &str, periods: &[Period]) -> Option<Domain> {
        let ranges: Vec<Domain> = periods
            .iter()
            .filter_map(Period::range)
            .map(|range| Domain::date_range(field, &range))
            .collect();
        if ranges.is_empty() {
            return None;
        }
        Some(Domain::or(ranges))
    }

    fn filter_domain(filter: &ActiveFilter) -> Domain {
        match &filter.selection {
            // periods are validated on insert
            Selection::Date(selection) => {
                Self::periods_domain(&filter.field, &selection.periods()).unwrap_or(Domain::True)
            }
            Selection::Values(values) => Domain::or(
                values
                    .iter()
                    .filter_map(|value| match value {
                        FilterValue::Text(s) => Some(Domain::leaf(
                            &filter.field,
                            Operator::Ilike,
                            DomainValue::Text(s.clone()),
                        )),
                        FilterValue::Number(n) => {
                            Some(Domain::leaf(&filter.field, Operator::Eq, DomainValue::Number(*n)))
                        }
                        _ => None,
                    })
                    .collect(),
            ),
        }
    }

    fn time_range(&self, comparison: ActiveComparison<'_>) -> Option<TimeRange> {
        let selection = self.date_selection(comparison.field)?;
        let periods = selection.periods();
        let shifted = selection.shifted_periods(comparison.kind);
        let range = Self::periods_domain(comparison.field, &periods)?;
        let Some(comparison_range) = Self::periods_domain(comparison.field, &shifted) else {
            warn!(field = comparison.field, kind = ?comparison.kind, "comparison range outside the calendar");
            return None;
        };
        Some(TimeRange {
            field_name: comparison.field.to_string(),
            comparison_id: comparison.kind,
            range,
            range_description: describe(&periods),
            comparison_range,
            comparison_range_description: describe(&shifted),
        })
    }

    /// Build the query; filters of one group are OR-ed, groups are AND-ed
    pub fn query(&self) -> Query {
        let domain = Domain::and(
            self.groups()
                .into_iter()
                .map(|group| {
                    Domain::or(
                        self.filters
                            .iter()
                            .filter(|f| self.config.group_of(&f.field) == group)
                            .map(Self::filter_domain)
                            .collect(),
                    )
                })
                .collect(),
        );

        let time_ranges: Vec<TimeRange> = if self.config.comparison_enabled() {
            self.active_comparisons()
                .filter_map(|c| self.time_range(c))
                .collect()
        } else {
            Vec::new()
        };
        let time_ranges = (!time_ranges.is_empty()).then_some(time_ranges);

        Query { domain, time_ranges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::DateOption::{Month, Year};
    use serde_json::json;

    fn composer() -> QueryComposer {
        let today = NaiveDate::from_ymd_opt(1997, 1, 9).unwrap();
        QueryComposer::with_today(SearchConfig::default(), today)
    }

    fn joined(parts: &[&str]) -> String {
        parts.join(FACET_SEPARATOR)
    }

    #[test]
    fn test_comparison_menu_rendering() {
        let mut composer = composer();
        assert!(composer.comparison_menu_items().is_empty());

        composer.toggle_date_option("birthday", Month(1)).unwrap();
        assert_eq!(
            composer.comparison_menu_items(),
            vec!["Birthday: Previous Period", "Birthday: Previous Year"]
        );
    }

    #[test]
    fn test_activate_comparison_scenario() {
        let mut composer = composer();

        composer.toggle_date_option("birthday", Month(1)).unwrap();
        composer.add_comparison("birthday", ComparisonKind::PreviousPeriod).unwrap();
        assert_eq!(
            composer.facet_texts(),
            vec!["Birthday: January 1997", "Birthday: Previous Period"]
        );

        composer.toggle_date_option("date_field", Month(12)).unwrap();
        composer.add_comparison("date_field", ComparisonKind::PreviousYear).unwrap();
        assert_eq!(
            composer.facet_texts(),
            vec![
                joined(&["Birthday: January 1997", "Date: December 1996"]),
                "Birthday: Previous Period".to_string(),
                "Date: Previous Year".to_string(),
            ]
        );

        composer.toggle_date_option("date_field", Year(1996)).unwrap();
        assert_eq!(
            composer.facet_texts(),
            vec!["Birthday: January 1997", "Birthday: Previous Period"]
        );

        composer.add_comparison("birthday", ComparisonKind::PreviousYear).unwrap();
        assert_eq!(
            composer.facet_texts(),
            vec!["Birthday: January 1997", "Birthday: Previous Year"]
        );

        composer.remove_facet(0).unwrap();
        assert!(composer.facet_texts().is_empty());
        assert!(composer.query().time_ranges.is_none());
    }

    #[test]
    fn test_exclusive_mode_keeps_single_comparison() {
        let config = SearchConfig::default().with_comparison_mode(ComparisonMode::Exclusive);
        let today = NaiveDate::from_ymd_opt(1997, 1, 9).unwrap();
        let mut composer = QueryComposer::with_today(config, today);

        composer.toggle_date_option("birthday", Month(1)).unwrap();
        composer.add_comparison("birthday", ComparisonKind::PreviousPeriod).unwrap();
        composer.toggle_date_option("date_field", Month(12)).unwrap();
        composer.add_comparison("date_field", ComparisonKind::PreviousYear).unwrap();
        assert_eq!(
            composer.facet_texts(),
            vec![
                joined(&["Birthday: January 1997", "Date: December 1996"]),
                "Date: Previous Year".to_string(),
            ]
        );

        composer.toggle_date_option("date_field", Year(1996)).unwrap();
        assert_eq!(composer.facet_texts(), vec!["Birthday: January 1997"]);
    }

    #[test]
    fn test_no_time_ranges_without_comparison_menu() {
        let today = NaiveDate::from_ymd_opt(1997, 1, 9).unwrap();
        let mut composer = QueryComposer::with_today(SearchConfig::default().without_comparison(), today);

        composer.toggle_date_option("birthday", Month(1)).unwrap();
        assert_eq!(
            composer.add_comparison("birthday", ComparisonKind::PreviousPeriod),
            Err(ComposerError::ComparisonDisabled)
        );

        let query = composer.query();
        assert!(query.time_ranges.is_none());
        let exported = serde_json::to_value(&query).unwrap();
        assert!(exported.get("timeRanges").is_none());
        assert!(composer.comparison_menu_items().is_empty());
    }

    #[test]
    fn test_comparison_requires_active_date_filter() {
        let mut composer = composer();
        assert_eq!(
            composer.add_comparison("birthday", ComparisonKind::PreviousYear),
            Err(ComposerError::NoActiveDateFilter("birthday".to_string()))
        );

        composer.add_filter("foo", FilterValue::Text("abc".to_string())).unwrap();
        assert!(composer.add_comparison("foo", ComparisonKind::PreviousYear).is_err());
        assert_eq!(composer.facet_texts(), vec!["Foo: abc"]);
    }

    #[test]
    fn test_time_range_for_previous_period() {
        let mut composer = composer();
        composer
            .add_filter("birthday", FilterValue::Month { year: 1997, month: 1 })
            .unwrap();
        composer.add_comparison("birthday", ComparisonKind::PreviousPeriod).unwrap();

        let query = composer.query();
        let ranges = query.time_ranges.unwrap();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].range_description, "January 1997");
        assert_eq!(ranges[0].comparison_range_description, "December 1996");
        assert_eq!(
            serde_json::to_value(&ranges[0].comparison_range).unwrap(),
            json!(["&", ["birthday", ">=", "1996-12-01"], ["birthday", "<", "1997-01-01"]])
        );
        assert_eq!(
            serde_json::to_value(&query.domain).unwrap(),
            json!(["&", ["birthday", ">=", "1997-01-01"], ["birthday", "<", "1997-02-01"]])
        );
    }

    #[test]
    fn test_independent_comparisons_per_field() {
        let mut composer = composer();
        composer.add_filter("birthday", FilterValue::Month { year: 1997, month: 1 }).unwrap();
        composer.add_filter("date_field", FilterValue::Quarter { year: 1996, quarter: 4 }).unwrap();
        composer.add_comparison("birthday", ComparisonKind::PreviousYear).unwrap();
        composer.add_comparison("date_field", ComparisonKind::PreviousPeriod).unwrap();

        let ranges = composer.query().time_ranges.unwrap();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].field_name, "birthday");
        assert_eq!(ranges[0].comparison_range_description, "January 1996");
        assert_eq!(ranges[1].field_name, "date_field");
        assert_eq!(ranges[1].comparison_range_description, "Q3 1996");
    }

    #[test]
    fn test_second_comparison_replaces_first() {
        let mut composer = composer();
        composer.add_filter("birthday", FilterValue::Year(1996)).unwrap();
        composer.add_comparison("birthday", ComparisonKind::PreviousPeriod).unwrap();
        composer.add_comparison("birthday", ComparisonKind::PreviousYear).unwrap();

        assert_eq!(composer.facet_texts(), vec!["Birthday: 1996", "Birthday: Previous Year"]);
        assert_eq!(composer.query().time_ranges.unwrap().len(), 1);
    }

    #[test]
    fn test_granularity_change_drops_comparison() {
        let mut composer = composer();
        composer.add_filter("birthday", FilterValue::Year(1997)).unwrap();
        composer.add_comparison("birthday", ComparisonKind::PreviousPeriod).unwrap();

        composer
            .add_filter("birthday", FilterValue::Month { year: 1997, month: 1 })
            .unwrap();
        assert_eq!(composer.facet_texts(), vec!["Birthday: January 1997/1997"]);
        assert!(composer.query().time_ranges.is_none());
    }

    #[test]
    fn test_same_granularity_keeps_comparison() {
        let mut composer = composer();
        composer.toggle_date_option("birthday", Month(1)).unwrap();
        composer.add_comparison("birthday", ComparisonKind::PreviousPeriod).unwrap();
        composer.toggle_date_option("birthday", Month(2)).unwrap();

        assert_eq!(
            composer.facet_texts(),
            vec!["Birthday: January 1997/February 1997", "Birthday: Previous Period"]
        );
        let ranges = composer.query().time_ranges.unwrap();
        assert_eq!(ranges[0].comparison_range_description, "December 1996/January 1997");
    }

    #[test]
    fn test_add_filter_keeps_exact_periods() {
        let mut composer = composer();
        composer
            .add_filter("birthday", FilterValue::Month { year: 1997, month: 1 })
            .unwrap();
        composer
            .add_filter("birthday", FilterValue::Month { year: 1996, month: 12 })
            .unwrap();

        assert_eq!(composer.facet_texts(), vec!["Birthday: December 1996/January 1997"]);
        assert_eq!(
            serde_json::to_value(&composer.query().domain).unwrap(),
            json!([
                "|",
                "&", ["birthday", ">=", "1996-12-01"], ["birthday", "<", "1997-01-01"],
                "&", ["birthday", ">=", "1997-01-01"], ["birthday", "<", "1997-02-01"]
            ])
        );
    }

    #[test]
    fn test_add_filter_year_does_not_rewrite_month() {
        let mut composer = composer();
        composer
            .add_filter("birthday", FilterValue::Month { year: 1997, month: 1 })
            .unwrap();
        composer.add_filter("birthday", FilterValue::Year(1996)).unwrap();

        assert_eq!(composer.facet_texts(), vec!["Birthday: January 1997/1996"]);
    }

    #[test]
    fn test_toggle_on_exact_periods_picks_default_year() {
        let mut composer = composer();
        composer.add_filter("birthday", FilterValue::Year(1995)).unwrap();
        composer.toggle_date_option("birthday", Month(12)).unwrap();

        assert_eq!(composer.facet_texts(), vec!["Birthday: December 1996/1995"]);
    }

    #[test]
    fn test_mixing_quarter_into_months_drops_comparison() {
        let mut composer = composer();
        composer
            .add_filter("birthday", FilterValue::Month { year: 1997, month: 1 })
            .unwrap();
        composer.add_comparison("birthday", ComparisonKind::PreviousPeriod).unwrap();

        composer
            .add_filter("birthday", FilterValue::Quarter { year: 1996, quarter: 4 })
            .unwrap();
        assert_eq!(composer.facet_texts(), vec!["Birthday: January 1997/Q4 1996"]);
        assert!(composer.query().time_ranges.is_none());

        composer.toggle_date_option("date_field", Month(1)).unwrap();
        composer.add_comparison("date_field", ComparisonKind::PreviousYear).unwrap();
        composer.toggle_date_option("date_field", DateOption::Quarter(1)).unwrap();
        assert_eq!(composer.facets().len(), 1);
    }

    #[test]
    fn test_comparison_outside_calendar_has_no_time_range() {
        use chrono::Datelike;

        let mut composer = composer();
        let first_year = NaiveDate::MIN.year();
        composer.add_filter("birthday", FilterValue::Year(first_year)).unwrap();
        composer.add_comparison("birthday", ComparisonKind::PreviousYear).unwrap();

        assert!(composer.query().time_ranges.is_none());
        assert!(!composer.query().domain.is_true());
    }

    #[test]
    fn test_remove_comparison_facet_keeps_filter() {
        let mut composer = composer();
        composer.toggle_date_option("birthday", Month(1)).unwrap();
        composer.add_comparison("birthday", ComparisonKind::PreviousYear).unwrap();

        composer.remove_facet(1).unwrap();
        assert_eq!(composer.facet_texts(), vec!["Birthday: January 1997"]);
        assert!(composer.query().time_ranges.is_none());
    }

    #[test]
    fn test_remove_facet_out_of_range() {
        let mut composer = composer();
        assert_eq!(
            composer.remove_facet(0),
            Err(ComposerError::FacetOutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn test_ungrouped_fields_are_anded() {
        let mut composer = composer();
        composer.add_filter("foo", FilterValue::Text("a".to_string())).unwrap();
        composer.add_filter("foo", FilterValue::Text("b".to_string())).unwrap();
        composer.add_filter("foo", FilterValue::Text("a".to_string())).unwrap();
        composer.add_filter("float_field", FilterValue::Number(2.5)).unwrap();

        assert_eq!(
            composer.facet_texts(),
            vec![joined(&["Foo: a", "Foo: b"]), "Float: 2.5".to_string()]
        );
        assert_eq!(
            serde_json::to_value(&composer.query().domain).unwrap(),
            json!(["&", "|", ["foo", "ilike", "a"], ["foo", "ilike", "b"], ["float_field", "=", 2.5]])
        );
    }

    #[test]
    fn test_value_type_checks() {
        let mut composer = composer();
        assert!(matches!(
            composer.add_filter("foo", FilterValue::Year(1997)),
            Err(ComposerError::ValueTypeMismatch { .. })
        ));
        assert!(matches!(
            composer.add_filter("birthday", FilterValue::Text("x".to_string())),
            Err(ComposerError::ValueTypeMismatch { .. })
        ));
        assert_eq!(
            composer.add_filter("nope", FilterValue::Number(1.0)),
            Err(ComposerError::UnknownField("nope".to_string()))
        );
        assert_eq!(
            composer.toggle_date_option("birthday", Month(13)),
            Err(ComposerError::InvalidDateOption("birthday".to_string()))
        );
        assert!(composer.facet_texts().is_empty());
    }

    #[test]
    fn test_facet_count_matches_live_facets() {
        let mut composer = composer();
        composer.toggle_date_option("birthday", Month(1)).unwrap();
        composer.add_filter("foo", FilterValue::Text("a".to_string())).unwrap();
        composer.add_comparison("birthday", ComparisonKind::PreviousYear).unwrap();
        assert_eq!(composer.facets().len(), 3);

        composer.remove_facet(1).unwrap();
        assert_eq!(composer.facet_texts(), vec!["Birthday: January 1997", "Birthday: Previous Year"]);

        composer.remove_facet(0).unwrap();
        assert!(composer.facets().is_empty());
        assert!(composer.query().domain.is_true());
    }
}
