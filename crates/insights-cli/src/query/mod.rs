//! The transaction query pipeline: filter, sort, and paginate an in-memory
//! transaction list. Pure and synchronous; callers fetch the records first.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::Transaction;

pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Sort orders accepted by the transactions endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortBy {
    #[serde(rename = "date_asc")]
    DateAsc,
    #[default]
    #[serde(rename = "date_desc")]
    DateDesc,
    #[serde(rename = "amount_asc")]
    AmountAsc,
    #[serde(rename = "amount_desc")]
    AmountDesc,
}

impl std::str::FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date_asc" => Ok(SortBy::DateAsc),
            "date_desc" => Ok(SortBy::DateDesc),
            "amount_asc" => Ok(SortBy::AmountAsc),
            "amount_desc" => Ok(SortBy::AmountDesc),
            other => Err(format!(
                "unknown sort order \"{other}\" (expected date_asc, date_desc, amount_asc, or amount_desc)"
            )),
        }
    }
}

/// One request against the transaction set, rebuilt from the caller's filter
/// state on every call.
#[derive(Debug, Clone, Default)]
pub struct QuerySpec {
    /// Page size; defaults to [DEFAULT_PAGE_SIZE].
    pub limit: Option<i64>,
    /// Records to skip; defaults to 0. Negative values clamp to 0.
    pub offset: Option<i64>,
    /// Exact-match category filter, case-sensitive.
    pub category: Option<String>,
    /// Earliest calendar day to include.
    pub start_date: Option<NaiveDate>,
    /// Latest calendar day to include; the whole day counts.
    pub end_date: Option<NaiveDate>,
    pub sort_by: SortBy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Matching records before windowing.
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
    pub total_pages: i64,
    pub current_page: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub pagination: Pagination,
}

/// Filter, sort, and paginate `transactions` according to `spec`.
///
/// The stages run in a fixed order: category filter, start-date filter,
/// end-date filter, sort, paginate. The sort is stable, so records with
/// equal keys keep their input order. The input is never mutated.
pub fn run(transactions: &[Transaction], spec: &QuerySpec) -> AppResult<TransactionPage> {
    let limit = spec.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if limit <= 0 {
        return Err(AppError::InvalidQuerySpec(format!(
            "limit must be a positive integer, got {limit}"
        )));
    }
    let offset = spec.offset.unwrap_or(0).max(0);

    let start_bound = spec.start_date.map(day_start);
    let end_bound = spec.end_date.map(day_end);

    let mut filtered: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| match &spec.category {
            Some(category) => t.category == *category,
            None => true,
        })
        .filter(|t| match start_bound {
            Some(start) => t.date >= start,
            None => true,
        })
        .filter(|t| match end_bound {
            Some(end) => t.date <= end,
            None => true,
        })
        .collect();

    match spec.sort_by {
        SortBy::DateAsc => filtered.sort_by(|a, b| a.date.cmp(&b.date)),
        SortBy::DateDesc => filtered.sort_by(|a, b| b.date.cmp(&a.date)),
        SortBy::AmountAsc => filtered.sort_by(|a, b| a.amount.total_cmp(&b.amount)),
        SortBy::AmountDesc => filtered.sort_by(|a, b| b.amount.total_cmp(&a.amount)),
    }

    let total = filtered.len() as i64;
    let page: Vec<Transaction> = filtered
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .cloned()
        .collect();

    Ok(TransactionPage {
        transactions: page,
        pagination: Pagination {
            total,
            limit,
            offset,
            has_more: offset + limit < total,
            total_pages: (total + limit - 1) / limit,
            current_page: offset / limit + 1,
        },
    })
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// The last representable instant of `date`, so a date-only end bound
/// includes the whole day.
fn day_end(date: NaiveDate) -> DateTime<Utc> {
    let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
        .expect("23:59:59.999 is a valid time");
    date.and_time(end_of_day).and_utc()
}
