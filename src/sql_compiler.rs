//! SQL compiler that converts a composed query to PostgreSQL using sea-query.

use crate::composer::{Query, TimeRange};
use crate::domain::{Condition, Domain, DomainValue, Operator};
use sea_query::{Asterisk, Expr, Func, Iden, PostgresQueryBuilder, SelectStatement, SimpleExpr, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Configuration for SQL optimization
#[derive(Debug, Clone)]
pub struct OptimizationConfig {
    /// Minimum number of OR-ed equalities on one field before converting to IN clause
    pub max_or_conditions_for_in: usize,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            max_or_conditions_for_in: 5,
        }
    }
}

/// Table identifier for sea-query
#[derive(Debug, Clone)]
pub struct TableName(pub String);

impl Iden for TableName {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        let _ = write!(s, "{}", self.0);
    }
}

/// Column identifier wrapper
#[derive(Debug, Clone)]
pub struct ColumnName(pub String);

impl Iden for ColumnName {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        let _ = write!(s, "{}", self.0);
    }
}

/// Represents an optimization applied during compilation
#[derive(Debug, Clone, PartialEq)]
pub enum Optimization {
    OrToIn { field: String, value_count: usize },
}

/// SQL of one comparison: the selected range and the range it is compared with
#[derive(Debug, Clone)]
pub struct TimeRangeSql {
    pub field: String,
    pub range_sql: String,
    pub comparison_sql: String,
}

/// Result of SQL compilation with optimization information
#[derive(Debug)]
pub struct CompileResult {
    pub sql: String,
    pub time_ranges: Vec<TimeRangeSql>,
    pub optimizations: Vec<Optimization>,
}

/// SQL Compiler that converts composed queries to SQL statements
pub struct SqlCompiler {
    config: OptimizationConfig,
    table: String,
}

impl SqlCompiler {
    pub fn new(table: &str) -> Self {
        Self::with_config(table, OptimizationConfig::default())
    }

    pub fn with_config(table: &str, config: OptimizationConfig) -> Self {
        Self {
            config,
            table: table.to_string(),
        }
    }

    /// Compile a query into the main statement plus one statement pair per time range
    pub fn compile(&self, query: &Query) -> CompileResult {
        let mut optimizations = Vec::new();
        let base = self.compile_domain(&query.domain, &mut optimizations);
        let sql = self.select(base);

        let time_ranges = query
            .time_ranges
            .iter()
            .flatten()
            .map(|range| self.compile_time_range(&query.domain, range, &mut optimizations))
            .collect();

        debug!(table = %self.table, optimizations = optimizations.len(), "compiled query");
        CompileResult {
            sql,
            time_ranges,
            optimizations,
        }
    }

    fn select(&self, condition: SimpleExpr) -> String {
        let mut select = SelectStatement::new();
        select.from(TableName(self.table.clone()));
        select.column(Asterisk);
        select.and_where(condition);
        select.to_string(PostgresQueryBuilder)
    }

    /// The compared field's own filter is swapped for each range in turn
    fn compile_time_range(
        &self,
        domain: &Domain,
        range: &TimeRange,
        optimizations: &mut Vec<Optimization>,
    ) -> TimeRangeSql {
        let field = range.field_name.as_str();
        let current = domain.replace_field(field, &range.range);
        let previous = domain.replace_field(field, &range.comparison_range);
        TimeRangeSql {
            field: range.field_name.clone(),
            range_sql: self.select(self.compile_domain(&current, optimizations)),
            comparison_sql: self.select(self.compile_domain(&previous, optimizations)),
        }
    }

    fn compile_domain(&self, domain: &Domain, optimizations: &mut Vec<Optimization>) -> SimpleExpr {
        match domain {
            Domain::True => Expr::val(true).into(),
            Domain::Leaf(condition) => self.compile_condition(condition),
            Domain::And(items) => {
                let conditions = items
                    .iter()
                    .map(|item| self.compile_domain(item, optimizations))
                    .collect();
                self.combine_conditions(conditions, SimpleExpr::and)
            }
            Domain::Or(items) => {
                let mut conditions = Vec::new();
                for (field, values) in self.equality_runs(items) {
                    if values.len() >= self.config.max_or_conditions_for_in {
                        optimizations.push(Optimization::OrToIn {
                            field: field.to_string(),
                            value_count: values.len(),
                        });
                        conditions.push(Expr::col(ColumnName(field.to_string())).is_in(values));
                    } else {
                        conditions.extend(
                            values
                                .into_iter()
                                .map(|value| Expr::col(ColumnName(field.to_string())).eq(value)),
                        );
                    }
                }
                conditions.extend(
                    items
                        .iter()
                        .filter(|item| Self::as_equality(item).is_none())
                        .map(|item| self.compile_domain(item, optimizations)),
                );
                self.combine_conditions(conditions, SimpleExpr::or)
            }
        }
    }

    fn as_equality(domain: &Domain) -> Option<&Condition> {
        match domain {
            Domain::Leaf(condition) if condition.op == Operator::Eq => Some(condition),
            _ => None,
        }
    }

    /// Group the equality leaves of an OR by field
    fn equality_runs<'a>(&self, items: &'a [Domain]) -> BTreeMap<&'a str, Vec<Value>> {
        let mut runs: BTreeMap<&str, Vec<Value>> = BTreeMap::new();
        for condition in items.iter().filter_map(Self::as_equality) {
            runs.entry(condition.field.as_str())
                .or_default()
                .push(self.domain_value(&condition.value));
        }
        runs
    }

    fn combine_conditions(
        &self,
        conditions: Vec<SimpleExpr>,
        op: fn(SimpleExpr, SimpleExpr) -> SimpleExpr,
    ) -> SimpleExpr {
        conditions
            .into_iter()
            .reduce(op)
            .unwrap_or_else(|| Expr::val(true).into())
    }

    /// Compile a single domain leaf
    fn compile_condition(&self, condition: &Condition) -> SimpleExpr {
        let col = Expr::col(ColumnName(condition.field.clone()));
        let val = self.domain_value(&condition.value);

        match condition.op {
            Operator::Eq => col.eq(val),
            Operator::Gte => col.gte(val),
            Operator::Lt => col.lt(val),
            Operator::Ilike => {
                let needle = match &condition.value {
                    DomainValue::Text(s) => s.to_lowercase(),
                    DomainValue::Number(n) => n.to_string(),
                    DomainValue::Date(d) => d.format("%Y-%m-%d").to_string(),
                };
                Expr::expr(Func::lower(col)).like(format!("%{}%", needle))
            }
        }
    }

    /// Convert a domain value to a sea-query value
    fn domain_value(&self, value: &DomainValue) -> Value {
        match value {
            DomainValue::Text(s) => Value::String(Some(Box::new(s.clone()))),
            DomainValue::Number(n) => Value::Double(Some(*n)),
            DomainValue::Date(d) => Value::String(Some(Box::new(d.format("%Y-%m-%d").to_string()))),
        }
    }
}
