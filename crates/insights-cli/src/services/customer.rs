//! Typed access to the customer-scoped dashboard endpoints. Each call takes
//! the client and customer id explicitly; the service keeps no state, so
//! racing callers simply see the most recently resolved response win.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::try_join;

use crate::error::{AppError, AppResult};
use crate::models::{
    CategoryBreakdown, CustomerProfile, FilterOptions, MonthlyTrend, SpendingGoal,
    SpendingSummary, Transaction, UserPublic,
};
use crate::query::{self, QuerySpec, TransactionPage};

use super::ApiClient;

/// Fallback period when the API has no entry for the requested one.
const DEFAULT_PERIOD: &str = "30d";

/// The id used for customer-scoped endpoints: the linked customer record if
/// present, otherwise the user's own id.
pub fn customer_id(user: &UserPublic) -> &str {
    user.customer_id.as_deref().unwrap_or(&user.id)
}

#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    transactions: Vec<Transaction>,
}

#[derive(Debug, Deserialize)]
struct TrendsResponse {
    trends: Vec<MonthlyTrend>,
}

#[derive(Debug, Deserialize)]
struct GoalsResponse {
    goals: Vec<SpendingGoal>,
}

/// Trend series trimmed to the requested window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendingTrends {
    pub trends: Vec<MonthlyTrend>,
    pub metadata: TrendsMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendsMetadata {
    pub months_requested: usize,
    pub total_months: usize,
}

pub async fn profile(client: &ApiClient, customer_id: &str) -> AppResult<CustomerProfile> {
    client
        .get(&format!("customers/{customer_id}/profile.json"))
        .await
}

/// Spending summary for one period. The endpoint returns every period keyed
/// by name; an unknown period falls back to the 30-day entry.
pub async fn spending_summary(
    client: &ApiClient,
    customer_id: &str,
    period: &str,
) -> AppResult<SpendingSummary> {
    let by_period: HashMap<String, SpendingSummary> = client
        .get_with_query(
            &format!("customers/{customer_id}/spending/summary.json"),
            &[("period", period.to_string())],
        )
        .await?;
    pick_period(by_period, period)
}

/// Per-category spending for one period, same keyed-by-period contract as
/// the summary endpoint.
pub async fn spending_categories(
    client: &ApiClient,
    customer_id: &str,
    period: &str,
) -> AppResult<CategoryBreakdown> {
    let by_period: HashMap<String, CategoryBreakdown> = client
        .get_with_query(
            &format!("customers/{customer_id}/spending/categories.json"),
            &[("period", period.to_string())],
        )
        .await?;
    pick_period(by_period, period)
}

/// Monthly spending trend, keeping only the trailing `months` entries.
pub async fn spending_trends(
    client: &ApiClient,
    customer_id: &str,
    months: usize,
) -> AppResult<SpendingTrends> {
    let response: TrendsResponse = client
        .get(&format!("customers/{customer_id}/spending/trends.json"))
        .await?;
    Ok(trim_trends(response.trends, months))
}

/// Fetch the customer's full transaction list and run the local
/// filter/sort/paginate pipeline over it.
pub async fn transactions(
    client: &ApiClient,
    customer_id: &str,
    spec: &QuerySpec,
) -> AppResult<TransactionPage> {
    let response: TransactionsResponse = client
        .get(&format!("customers/{customer_id}/transactions.json"))
        .await?;
    query::run(&response.transactions, spec)
}

pub async fn spending_goals(
    client: &ApiClient,
    customer_id: &str,
) -> AppResult<Vec<SpendingGoal>> {
    let response: GoalsResponse = client
        .get(&format!("customers/{customer_id}/goals.json"))
        .await?;
    Ok(response.goals)
}

pub async fn filter_options(client: &ApiClient, customer_id: &str) -> AppResult<FilterOptions> {
    client
        .get(&format!("customers/{customer_id}/filters.json"))
        .await
}

/// Everything the dashboard shows, fetched concurrently.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub profile: CustomerProfile,
    pub summary: SpendingSummary,
    pub categories: CategoryBreakdown,
    pub trends: SpendingTrends,
    pub recent_transactions: TransactionPage,
    pub goals: Vec<SpendingGoal>,
    pub filters: FilterOptions,
    pub metadata: DashboardMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetadata {
    pub period: String,
    pub months: usize,
    pub customer_id: String,
    pub fetched_at: DateTime<Utc>,
}

pub async fn dashboard(
    client: &ApiClient,
    customer_id: &str,
    period: &str,
    months: usize,
    transaction_limit: i64,
) -> AppResult<DashboardData> {
    let recent_spec = QuerySpec {
        limit: Some(transaction_limit),
        ..Default::default()
    };

    let (profile, summary, categories, trends, recent_transactions, goals, filters) = try_join!(
        profile(client, customer_id),
        spending_summary(client, customer_id, period),
        spending_categories(client, customer_id, period),
        spending_trends(client, customer_id, months),
        transactions(client, customer_id, &recent_spec),
        spending_goals(client, customer_id),
        filter_options(client, customer_id),
    )?;

    Ok(DashboardData {
        profile,
        summary,
        categories,
        trends,
        recent_transactions,
        goals,
        filters,
        metadata: DashboardMetadata {
            period: period.to_string(),
            months,
            customer_id: customer_id.to_string(),
            fetched_at: Utc::now(),
        },
    })
}

fn pick_period<T>(mut by_period: HashMap<String, T>, period: &str) -> AppResult<T> {
    if let Some(value) = by_period.remove(period) {
        return Ok(value);
    }
    by_period
        .remove(DEFAULT_PERIOD)
        .ok_or_else(|| AppError::UnexpectedResponse(format!("no data for period {period}")))
}

fn trim_trends(trends: Vec<MonthlyTrend>, months: usize) -> SpendingTrends {
    let total_months = trends.len();
    let mut trends = trends;
    let trends = trends.split_off(total_months.saturating_sub(months));

    SpendingTrends {
        trends,
        metadata: TrendsMetadata {
            months_requested: months,
            total_months,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::error::AppError;
    use crate::models::{MonthlyTrend, UserPublic};

    use super::{customer_id, pick_period, trim_trends};

    fn trend(month: &str) -> MonthlyTrend {
        MonthlyTrend {
            month: month.to_string(),
            total_spent: 1000.0,
            transaction_count: 10,
            average_transaction: 100.0,
        }
    }

    #[test]
    fn customer_id_prefers_the_linked_record() {
        let mut user = UserPublic {
            id: "u1".to_string(),
            email: "a@x.com".to_string(),
            name: "A".to_string(),
            customer_id: Some("cust_12345".to_string()),
        };
        assert_eq!(customer_id(&user), "cust_12345");

        user.customer_id = None;
        assert_eq!(customer_id(&user), "u1");
    }

    #[test]
    fn pick_period_falls_back_to_thirty_days() {
        let mut by_period = HashMap::new();
        by_period.insert("30d".to_string(), 30);
        by_period.insert("7d".to_string(), 7);

        assert_eq!(pick_period(by_period.clone(), "7d").unwrap(), 7);
        assert_eq!(pick_period(by_period, "14d").unwrap(), 30);
    }

    #[test]
    fn pick_period_errors_when_even_the_fallback_is_missing() {
        let by_period: HashMap<String, i32> = HashMap::new();
        assert!(matches!(
            pick_period(by_period, "7d"),
            Err(AppError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn trim_trends_keeps_the_trailing_months() {
        let series = vec![trend("2024-10"), trend("2024-11"), trend("2024-12")];

        let trimmed = trim_trends(series.clone(), 2);
        let months: Vec<&str> = trimmed.trends.iter().map(|t| t.month.as_str()).collect();
        assert_eq!(months, ["2024-11", "2024-12"]);
        assert_eq!(trimmed.metadata.months_requested, 2);
        assert_eq!(trimmed.metadata.total_months, 3);

        // Asking for more than exists returns the whole series.
        let all = trim_trends(series, 12);
        assert_eq!(all.trends.len(), 3);
    }
}
