//! Console commands of the search shell.
//!
//! ```text
//! filter <field> <value>      add a filter value (1997-01, 1997-Q1, 1997, text, number)
//! toggle <field> <option>     toggle a date option (january..december, q1..q4, 1997)
//! compare <field> <kind>      previous_period | previous_year
//! remove <index>              remove the facet at a position
//! facets | menu | query | sql | help | quit
//! ```

use crate::composer::FilterValue;
use crate::config::FieldType;
use crate::period::{ComparisonKind, DateOption};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("empty input")]
    Empty,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("'{command}' expects: {usage}")]
    Usage {
        command: &'static str,
        usage: &'static str,
    },
    #[error("cannot read '{value}' as {expected}")]
    BadValue {
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Raw value, resolved against the field type by [`parse_filter_value`]
    Filter { field: String, value: String },
    Toggle { field: String, option: DateOption },
    Compare { field: String, kind: ComparisonKind },
    Remove(usize),
    Facets,
    Menu,
    Query,
    Sql,
    Help,
    Quit,
}

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

impl Command {
    pub fn parse(line: &str) -> Result<Command, CommandError> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(CommandError::Empty)?;
        let args: Vec<&str> = words.collect();

        match (name.to_lowercase().as_str(), args.as_slice()) {
            ("filter", [field, value @ ..]) if !value.is_empty() => Ok(Command::Filter {
                field: field.to_string(),
                value: value.join(" "),
            }),
            ("filter", _) => Err(CommandError::Usage {
                command: "filter",
                usage: "filter <field> <value>",
            }),
            ("toggle", [field, option]) => Ok(Command::Toggle {
                field: field.to_string(),
                option: parse_date_option(option)?,
            }),
            ("toggle", _) => Err(CommandError::Usage {
                command: "toggle",
                usage: "toggle <field> <month|q1-q4|year>",
            }),
            ("compare", [field, kind]) => Ok(Command::Compare {
                field: field.to_string(),
                kind: parse_comparison(kind)?,
            }),
            ("compare", _) => Err(CommandError::Usage {
                command: "compare",
                usage: "compare <field> <previous_period|previous_year>",
            }),
            ("remove", [index]) => index.parse().map(Command::Remove).map_err(|_| CommandError::BadValue {
                value: index.to_string(),
                expected: "a facet index",
            }),
            ("remove", _) => Err(CommandError::Usage {
                command: "remove",
                usage: "remove <index>",
            }),
            ("facets", []) => Ok(Command::Facets),
            ("menu", []) => Ok(Command::Menu),
            ("query", []) => Ok(Command::Query),
            ("sql", []) => Ok(Command::Sql),
            ("help", _) => Ok(Command::Help),
            ("quit" | "exit", _) => Ok(Command::Quit),
            (other, _) => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

pub fn parse_date_option(word: &str) -> Result<DateOption, CommandError> {
    let lower = word.to_lowercase();
    if let Some(index) = MONTHS.iter().position(|m| *m == lower) {
        return Ok(DateOption::Month(index as u32 + 1));
    }
    if let Some(quarter) = lower.strip_prefix('q').and_then(|q| q.parse::<u32>().ok()) {
        return Ok(DateOption::Quarter(quarter));
    }
    lower.parse().map(DateOption::Year).map_err(|_| CommandError::BadValue {
        value: word.to_string(),
        expected: "a month name, quarter or year",
    })
}

fn parse_comparison(word: &str) -> Result<ComparisonKind, CommandError> {
    match word.to_lowercase().as_str() {
        "previous_period" | "period" => Ok(ComparisonKind::PreviousPeriod),
        "previous_year" | "year" => Ok(ComparisonKind::PreviousYear),
        _ => Err(CommandError::BadValue {
            value: word.to_string(),
            expected: "previous_period or previous_year",
        }),
    }
}

/// Read a raw value according to the type of the field it filters
pub fn parse_filter_value(field_type: FieldType, raw: &str) -> Result<FilterValue, CommandError> {
    if field_type.is_numeric() {
        return raw.parse().map(FilterValue::Number).map_err(|_| CommandError::BadValue {
            value: raw.to_string(),
            expected: "a number",
        });
    }
    if !field_type.is_date() {
        return Ok(FilterValue::Text(raw.to_string()));
    }

    let bad = || CommandError::BadValue {
        value: raw.to_string(),
        expected: "YYYY, YYYY-MM or YYYY-Qn",
    };
    match raw.split_once('-') {
        None => raw.parse().map(FilterValue::Year).map_err(|_| bad()),
        Some((year, unit)) => {
            let year = year.parse().map_err(|_| bad())?;
            match unit.strip_prefix(['Q', 'q']) {
                Some(quarter) => Ok(FilterValue::Quarter {
                    year,
                    quarter: quarter.parse().map_err(|_| bad())?,
                }),
                None => Ok(FilterValue::Month {
                    year,
                    month: unit.parse().map_err(|_| bad())?,
                }),
            }
        }
    }
}
