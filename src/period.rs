//! Date periods, their resolved ranges and the comparison shifts between them.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Date resolution a filter operates at
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Month,
    Quarter,
    Year,
}

impl Granularity {
    fn months(self) -> u32 {
        match self {
            Granularity::Month => 1,
            Granularity::Quarter => 3,
            Granularity::Year => 12,
        }
    }
}

/// Relative shift used by a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonKind {
    PreviousPeriod,
    PreviousYear,
}

impl ComparisonKind {
    pub const ALL: [ComparisonKind; 2] = [ComparisonKind::PreviousPeriod, ComparisonKind::PreviousYear];

    pub fn label(self) -> &'static str {
        match self {
            ComparisonKind::PreviousPeriod => "Previous Period",
            ComparisonKind::PreviousYear => "Previous Year",
        }
    }
}

/// Half-open date range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One concrete calendar period
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Period {
    Month { year: i32, month: u32 },
    Quarter { year: i32, quarter: u32 },
    Year(i32),
}

impl Period {
    pub fn granularity(&self) -> Granularity {
        match self {
            Period::Month { .. } => Granularity::Month,
            Period::Quarter { .. } => Granularity::Quarter,
            Period::Year(_) => Granularity::Year,
        }
    }

    fn first_day(&self) -> Option<NaiveDate> {
        match *self {
            Period::Month { year, month } if (1..=12).contains(&month) => {
                NaiveDate::from_ymd_opt(year, month, 1)
            }
            Period::Quarter { year, quarter } if (1..=4).contains(&quarter) => {
                NaiveDate::from_ymd_opt(year, (quarter - 1) * 3 + 1, 1)
            }
            Period::Year(year) => NaiveDate::from_ymd_opt(year, 1, 1),
            _ => None,
        }
    }

    /// Resolve the period to its `[start, end)` range; `None` for out-of-calendar periods
    pub fn range(&self) -> Option<DateRange> {
        let start = self.first_day()?;
        let end = start.checked_add_months(Months::new(self.granularity().months()))?;
        Some(DateRange { start, end })
    }

    /// The period a comparison of `kind` targets
    pub fn shifted(&self, kind: ComparisonKind) -> Period {
        match (kind, *self) {
            (ComparisonKind::PreviousYear, Period::Month { year, month }) => {
                Period::Month { year: year - 1, month }
            }
            (ComparisonKind::PreviousYear, Period::Quarter { year, quarter }) => {
                Period::Quarter { year: year - 1, quarter }
            }
            (_, Period::Year(year)) => Period::Year(year - 1),
            (ComparisonKind::PreviousPeriod, Period::Month { year, month }) => {
                if month == 1 {
                    Period::Month { year: year - 1, month: 12 }
                } else {
                    Period::Month { year, month: month - 1 }
                }
            }
            (ComparisonKind::PreviousPeriod, Period::Quarter { year, quarter }) => {
                if quarter == 1 {
                    Period::Quarter { year: year - 1, quarter: 4 }
                } else {
                    Period::Quarter { year, quarter: quarter - 1 }
                }
            }
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Period::Month { year, month } => match self.first_day() {
                Some(day) => write!(f, "{}", day.format("%B %Y")),
                None => write!(f, "{}-{:02}", year, month),
            },
            Period::Quarter { year, quarter } => write!(f, "Q{} {}", quarter, year),
            Period::Year(year) => write!(f, "{}", year),
        }
    }
}

/// A single entry of a date filter's option list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateOption {
    Month(u32),
    Quarter(u32),
    Year(i32),
}

impl DateOption {
    /// Year selected alongside a month/quarter when no year is active: the
    /// most recent occurrence of the option that is not after `today`
    pub fn default_year(&self, today: NaiveDate) -> i32 {
        match *self {
            DateOption::Month(month) if month > today.month() => today.year() - 1,
            DateOption::Quarter(quarter) if quarter > today.month0() / 3 + 1 => today.year() - 1,
            DateOption::Year(year) => year,
            _ => today.year(),
        }
    }

    pub fn is_valid(&self) -> bool {
        match *self {
            DateOption::Month(month) => (1..=12).contains(&month),
            DateOption::Quarter(quarter) => (1..=4).contains(&quarter),
            DateOption::Year(year) => NaiveDate::from_ymd_opt(year, 1, 1)
                .and_then(|d| d.checked_add_months(Months::new(12)))
                .is_some(),
        }
    }
}

/// Selected options of one date filter.
///
/// Menu options combine as years × (months ∪ quarters); periods added whole
/// are kept as given and merged in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateSelection {
    years: BTreeSet<i32>,
    months: BTreeSet<u32>,
    quarters: BTreeSet<u32>,
    explicit: BTreeSet<Period>,
}

impl DateSelection {
    pub fn is_empty(&self) -> bool {
        self.years.is_empty() && self.explicit.is_empty()
    }

    /// No year picked from the menu yet
    pub fn menu_is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn contains(&self, option: DateOption) -> bool {
        match option {
            DateOption::Month(m) => self.months.contains(&m),
            DateOption::Quarter(q) => self.quarters.contains(&q),
            DateOption::Year(y) => self.years.contains(&y),
        }
    }

    pub fn insert(&mut self, option: DateOption) {
        match option {
            DateOption::Month(m) => self.months.insert(m),
            DateOption::Quarter(q) => self.quarters.insert(q),
            DateOption::Year(y) => self.years.insert(y),
        };
    }

    /// Add one exact period, outside the menu product
    pub fn insert_period(&mut self, period: Period) {
        self.explicit.insert(period);
    }

    /// Remove a menu option; removing the last year clears the menu options
    pub fn remove(&mut self, option: DateOption) {
        match option {
            DateOption::Month(m) => {
                self.months.remove(&m);
            }
            DateOption::Quarter(q) => {
                self.quarters.remove(&q);
            }
            DateOption::Year(y) => {
                self.years.remove(&y);
                if self.years.is_empty() {
                    self.months.clear();
                    self.quarters.clear();
                }
            }
        }
    }

    /// Units of the active periods
    pub fn units(&self) -> BTreeSet<Granularity> {
        self.periods().iter().map(Period::granularity).collect()
    }

    /// Finest unit present in the selection
    pub fn granularity(&self) -> Granularity {
        self.units().into_iter().next().unwrap_or(Granularity::Year)
    }

    /// Active periods, deduplicated and ordered
    pub fn periods(&self) -> Vec<Period> {
        let mut periods = self.explicit.clone();
        for &year in &self.years {
            if self.months.is_empty() && self.quarters.is_empty() {
                periods.insert(Period::Year(year));
                continue;
            }
            periods.extend(self.months.iter().map(|&month| Period::Month { year, month }));
            periods.extend(self.quarters.iter().map(|&quarter| Period::Quarter { year, quarter }));
        }
        periods.into_iter().collect()
    }

    /// Periods targeted by a comparison, deduplicated and ordered
    pub fn shifted_periods(&self, kind: ComparisonKind) -> Vec<Period> {
        let shifted: BTreeSet<Period> = self.periods().iter().map(|p| p.shifted(kind)).collect();
        shifted.into_iter().collect()
    }
}

pub fn describe(periods: &[Period]) -> String {
    periods
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join("/")
}
