use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A record from the customer directory. Carries the plaintext password the
/// directory ships, so it is deserialize-only and must never leave the
/// authentication path.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub customer_id: Option<String>,
}

/// The password-stripped projection of a directory record. This is the only
/// form that gets cached or handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPublic {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub customer_id: Option<String>,
}

impl From<User> for UserPublic {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            customer_id: u.customer_id,
        }
    }
}

/// A single card/EFT transaction. Immutable once fetched; the query pipeline
/// only derives views over these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub date: DateTime<Utc>,
    pub merchant: String,
    pub category: String,
    /// Amount in ZAR.
    pub amount: f64,
    pub description: String,
    pub payment_method: String,
    pub icon: String,
    pub category_color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    pub customer_id: String,
    pub name: String,
    pub email: String,
    pub join_date: NaiveDate,
    pub account_type: String,
    pub total_spent: f64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodComparison {
    pub spent_change: f64,
    pub transaction_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingSummary {
    pub period: String,
    pub total_spent: f64,
    pub transaction_count: i64,
    pub average_transaction: f64,
    pub top_category: String,
    pub compared_to_previous: PeriodComparison,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpending {
    pub name: String,
    pub amount: f64,
    pub percentage: f64,
    pub transaction_count: i64,
    pub color: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub date_range: DateRange,
    pub total_amount: f64,
    pub categories: Vec<CategorySpending>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrend {
    /// Calendar month in `YYYY-MM` form.
    pub month: String,
    pub total_spent: f64,
    pub transaction_count: i64,
    pub average_transaction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingGoal {
    pub id: String,
    pub category: String,
    pub monthly_budget: f64,
    pub current_spent: f64,
    pub percentage_used: f64,
    pub days_remaining: i64,
    /// "on_track" or "warning".
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryOption {
    pub name: String,
    pub color: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangePreset {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub categories: Vec<CategoryOption>,
    pub date_range_presets: Vec<DateRangePreset>,
}
