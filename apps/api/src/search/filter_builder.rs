//! Query Filter Builder: turns `JobFilters` into a predicate tree, and the tree into SQL.
//!
//! Building is pure and deterministic; rendering pushes every user-supplied value as a
//! bound parameter, never as SQL text.

use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};

use crate::models::job::JobStatus;
use crate::search::models::JobFilters;

/// Job columns a predicate may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Status,
    ExpiresAt,
    Location,
    IsRemote,
    Title,
    Description,
    Categories,
    JobType,
    SalaryMin,
    SalaryMax,
}

impl Column {
    pub fn sql(&self) -> &'static str {
        match self {
            Column::Status => "status",
            Column::ExpiresAt => "expires_at",
            Column::Location => "location",
            Column::IsRemote => "is_remote",
            Column::Title => "title",
            Column::Description => "description",
            Column::Categories => "categories",
            Column::JobType => "job_type",
            Column::SalaryMin => "salary_min",
            Column::SalaryMax => "salary_max",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Bool(bool),
}

/// Boolean predicate over job rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Eq(Column, Value),
    /// Case-insensitive substring match.
    ContainsCi(Column, String),
    /// Some element of an array column equals the value, ignoring case.
    AnyEqualsCi(Column, String),
    /// Some element of an array column contains the value, ignoring case.
    AnyContainsCi(Column, String),
    IsNull(Column),
    After(Column, DateTime<Utc>),
    AtLeast(Column, i32),
    AtMost(Column, i32),
}

impl Predicate {
    /// Renders the predicate into `qb`, binding all values.
    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Predicate::And(children) => push_joined(qb, children, " AND ", "TRUE"),
            Predicate::Or(children) => push_joined(qb, children, " OR ", "FALSE"),
            Predicate::Eq(column, value) => {
                qb.push(column.sql()).push(" = ");
                match value {
                    Value::Text(text) => qb.push_bind(text.clone()),
                    Value::Bool(flag) => qb.push_bind(*flag),
                };
            }
            Predicate::ContainsCi(column, needle) => {
                qb.push(column.sql())
                    .push(" ILIKE ")
                    .push_bind(like_pattern(needle));
            }
            Predicate::AnyEqualsCi(column, value) => {
                qb.push("EXISTS (SELECT 1 FROM unnest(")
                    .push(column.sql())
                    .push(") AS elem WHERE lower(elem) = lower(")
                    .push_bind(value.clone())
                    .push("))");
            }
            Predicate::AnyContainsCi(column, needle) => {
                qb.push("EXISTS (SELECT 1 FROM unnest(")
                    .push(column.sql())
                    .push(") AS elem WHERE elem ILIKE ")
                    .push_bind(like_pattern(needle))
                    .push(")");
            }
            Predicate::IsNull(column) => {
                qb.push(column.sql()).push(" IS NULL");
            }
            Predicate::After(column, at) => {
                qb.push(column.sql()).push(" > ").push_bind(*at);
            }
            Predicate::AtLeast(column, value) => {
                qb.push(column.sql()).push(" >= ").push_bind(*value);
            }
            Predicate::AtMost(column, value) => {
                qb.push(column.sql()).push(" <= ").push_bind(*value);
            }
        }
    }
}

fn push_joined(
    qb: &mut QueryBuilder<'_, Postgres>,
    children: &[Predicate],
    separator: &str,
    empty: &str,
) {
    if children.is_empty() {
        qb.push(empty);
        return;
    }
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            qb.push(separator);
        }
        qb.push("(");
        child.push_sql(qb);
        qb.push(")");
    }
}

/// `%needle%` with LIKE metacharacters escaped (backslash is Postgres' default escape).
pub fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// A single keyword matches if it appears in the title, the description or any category.
pub fn keyword_predicate(keyword: &str) -> Predicate {
    Predicate::Or(vec![
        Predicate::ContainsCi(Column::Title, keyword.to_string()),
        Predicate::ContainsCi(Column::Description, keyword.to_string()),
        Predicate::AnyContainsCi(Column::Categories, keyword.to_string()),
    ])
}

/// Builds the full search predicate: an AND of fixed clauses and one clause per supplied filter.
///
/// Fixed clauses: the job is active, unexpired at `now`, and (unless remote jobs were asked for)
/// located in one of the `allow_list` cities. An empty allow-list means no regional scoping.
pub fn build_predicate(filters: &JobFilters, now: DateTime<Utc>, allow_list: &[&str]) -> Predicate {
    let mut clauses = vec![
        Predicate::Eq(
            Column::Status,
            Value::Text(JobStatus::Active.as_str().to_string()),
        ),
        Predicate::Or(vec![
            Predicate::IsNull(Column::ExpiresAt),
            Predicate::After(Column::ExpiresAt, now),
        ]),
    ];

    if filters.is_remote == Some(true) {
        clauses.push(Predicate::Eq(Column::IsRemote, Value::Bool(true)));
    } else {
        if !allow_list.is_empty() {
            clauses.push(Predicate::Or(
                allow_list
                    .iter()
                    .map(|city| Predicate::ContainsCi(Column::Location, city.to_string()))
                    .collect(),
            ));
        }
        if let Some(location) = non_blank(filters.location.as_deref()) {
            clauses.push(Predicate::ContainsCi(Column::Location, location.to_string()));
        }
    }

    for keyword in filters.keywords.iter().filter_map(|k| non_blank(Some(k))) {
        clauses.push(keyword_predicate(keyword));
    }

    if let Some(job_type) = filters.job_type {
        clauses.push(Predicate::Eq(
            Column::JobType,
            Value::Text(job_type.as_str().to_string()),
        ));
    }

    let categories: Vec<Predicate> = filters
        .categories
        .iter()
        .filter_map(|c| non_blank(Some(c)))
        .map(|c| Predicate::AnyEqualsCi(Column::Categories, c.to_string()))
        .collect();
    if !categories.is_empty() {
        clauses.push(Predicate::Or(categories));
    }

    if let Some(min) = filters.salary_min {
        clauses.push(Predicate::Or(vec![
            Predicate::AtLeast(Column::SalaryMax, min),
            Predicate::And(vec![
                Predicate::IsNull(Column::SalaryMax),
                Predicate::AtLeast(Column::SalaryMin, min),
            ]),
        ]));
    }

    if let Some(max) = filters.salary_max {
        clauses.push(Predicate::AtMost(Column::SalaryMin, max));
    }

    Predicate::And(clauses)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
