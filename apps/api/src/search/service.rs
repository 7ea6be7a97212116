//! Job Search Service: applies the predicate tree, ranks and paginates.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::errors::AppError;
use crate::models::job::JobRow;
use crate::search::filter_builder::{build_predicate, Column, Predicate};
use crate::search::models::{JobFilters, SearchOptions, SortOrder, MAX_PER_PAGE};

/// Relevance weight per keyword hit: title 3, category 2, description 1.
const TITLE_WEIGHT: i32 = 3;
const CATEGORY_WEIGHT: i32 = 2;
const DESCRIPTION_WEIGHT: i32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub jobs: Vec<JobRow>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

pub fn validate_search(filters: &JobFilters, options: &SearchOptions) -> Result<(), AppError> {
    if options.page == 0 {
        return Err(AppError::Validation("page must be at least 1".to_string()));
    }
    if options.per_page == 0 || options.per_page > MAX_PER_PAGE {
        return Err(AppError::Validation(format!(
            "per_page must be between 1 and {MAX_PER_PAGE}"
        )));
    }
    if filters.salary_min.is_some_and(|v| v < 0) || filters.salary_max.is_some_and(|v| v < 0) {
        return Err(AppError::Validation(
            "salary bounds cannot be negative".to_string(),
        ));
    }
    if let (Some(min), Some(max)) = (filters.salary_min, filters.salary_max) {
        if min > max {
            return Err(AppError::Validation(
                "salary_min cannot exceed salary_max".to_string(),
            ));
        }
    }
    Ok(())
}

/// Weighted predicates whose sum ranks a job for the given keywords.
pub fn rank_terms(keywords: &[String]) -> Vec<(Predicate, i32)> {
    keywords
        .iter()
        .flat_map(|keyword| {
            [
                (
                    Predicate::ContainsCi(Column::Title, keyword.clone()),
                    TITLE_WEIGHT,
                ),
                (
                    Predicate::AnyContainsCi(Column::Categories, keyword.clone()),
                    CATEGORY_WEIGHT,
                ),
                (
                    Predicate::ContainsCi(Column::Description, keyword.clone()),
                    DESCRIPTION_WEIGHT,
                ),
            ]
        })
        .collect()
}

fn push_order_by(qb: &mut QueryBuilder<'_, Postgres>, filters: &JobFilters, sort: SortOrder) {
    qb.push(" ORDER BY ");
    match sort {
        SortOrder::Relevance if !filters.keywords.is_empty() => {
            qb.push("(");
            for (i, (predicate, weight)) in rank_terms(&filters.keywords).iter().enumerate() {
                if i > 0 {
                    qb.push(" + ");
                }
                qb.push("CASE WHEN (");
                predicate.push_sql(qb);
                qb.push(format!(") THEN {weight} ELSE 0 END"));
            }
            qb.push(") DESC, posted_at DESC NULLS LAST");
        }
        SortOrder::Relevance | SortOrder::Newest => {
            qb.push("posted_at DESC NULLS LAST");
        }
        SortOrder::Salary => {
            qb.push("COALESCE(salary_max, salary_min) DESC NULLS LAST, posted_at DESC NULLS LAST");
        }
    }
    qb.push(", id");
}

fn total_pages(total: i64, per_page: u32) -> u32 {
    if total <= 0 {
        return 0;
    }
    let per_page = i64::from(per_page.max(1));
    u32::try_from((total + per_page - 1) / per_page).unwrap_or(u32::MAX)
}

/// Runs a search: one COUNT over the predicate, then the requested page.
pub async fn search_jobs(
    pool: &PgPool,
    filters: &JobFilters,
    options: SearchOptions,
    now: DateTime<Utc>,
    allow_list: &[&str],
) -> Result<SearchResults, AppError> {
    validate_search(filters, &options)?;

    let predicate = build_predicate(filters, now, allow_list);

    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM jobs WHERE ");
    predicate.push_sql(&mut count_qb);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let offset = i64::from(options.page - 1) * i64::from(options.per_page);

    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM jobs WHERE ");
    predicate.push_sql(&mut qb);
    push_order_by(&mut qb, filters, options.sort);
    qb.push(" LIMIT ")
        .push_bind(i64::from(options.per_page))
        .push(" OFFSET ")
        .push_bind(offset);

    let jobs = qb.build_query_as::<JobRow>().fetch_all(pool).await?;

    debug!(
        "Search matched {total} jobs, returning {} (page {})",
        jobs.len(),
        options.page
    );

    Ok(SearchResults {
        jobs,
        total,
        page: options.page,
        per_page: options.per_page,
        total_pages: total_pages(total, options.per_page),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(page: u32, per_page: u32) -> SearchOptions {
        SearchOptions {
            page,
            per_page,
            sort: SortOrder::Relevance,
        }
    }

    #[test]
    fn test_pagination_bounds() {
        let filters = JobFilters::default();
        assert!(validate_search(&filters, &options(1, 20)).is_ok());
        assert!(validate_search(&filters, &options(0, 20)).is_err());
        assert!(validate_search(&filters, &options(1, 0)).is_err());
        assert!(validate_search(&filters, &options(1, MAX_PER_PAGE + 1)).is_err());
    }

    #[test]
    fn test_salary_bounds_must_be_ordered() {
        let filters = JobFilters {
            salary_min: Some(80_000),
            salary_max: Some(50_000),
            ..Default::default()
        };
        assert!(matches!(
            validate_search(&filters, &SearchOptions::default()),
            Err(AppError::Validation(_))
        ));

        let negative = JobFilters {
            salary_min: Some(-1),
            ..Default::default()
        };
        assert!(validate_search(&negative, &SearchOptions::default()).is_err());
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
    }

    #[test]
    fn test_rank_terms_weights_title_highest() {
        let terms = rank_terms(&["nurse".to_string()]);
        assert_eq!(terms.len(), 3);
        assert_eq!(
            terms[0],
            (Predicate::ContainsCi(Column::Title, "nurse".to_string()), 3)
        );
        assert_eq!(terms[1].1, 2);
        assert_eq!(terms[2].1, 1);
    }

    #[test]
    fn test_order_by_relevance_uses_rank_expression() {
        let filters = JobFilters {
            keywords: vec!["nurse".to_string()],
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM jobs WHERE TRUE");
        push_order_by(&mut qb, &filters, SortOrder::Relevance);
        let sql = qb.sql();
        assert!(sql.contains("ORDER BY (CASE WHEN (title ILIKE $1) THEN 3 ELSE 0 END"));
        assert!(sql.ends_with(") DESC, posted_at DESC NULLS LAST, id"));
    }

    #[test]
    fn test_order_by_relevance_without_keywords_falls_back_to_newest() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM jobs WHERE TRUE");
        push_order_by(&mut qb, &JobFilters::default(), SortOrder::Relevance);
        assert!(qb.sql().ends_with(" ORDER BY posted_at DESC NULLS LAST, id"));
    }
}
