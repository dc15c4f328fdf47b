//! End-to-end flows against an in-process stand-in for the customer API:
//! sign in, persist the session, then query transactions and the dashboard
//! aggregate through the real client.

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use insights_cli::auth::{self, token};
use insights_cli::config::Config;
use insights_cli::error::{AppError, AuthField};
use insights_cli::query::{QuerySpec, SortBy};
use insights_cli::services::{customer, ApiClient};
use insights_cli::storage::MemoryStore;

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

fn client_for(base_url: String) -> ApiClient {
    ApiClient::new(&Config {
        api_url: base_url,
        maintenance: false,
        session_file: String::new(),
        http_timeout_ms: 5_000,
    })
}

fn directory_records() -> Value {
    json!([
        {
            "id": "u1",
            "email": "thabo@example.co.za",
            "name": "Thabo Mokoena",
            "password": "p1",
            "customerId": "cust_12345"
        },
        {
            "id": "u2",
            "email": "lerato@example.co.za",
            "name": "Lerato Dlamini",
            "password": "p2"
        }
    ])
}

fn transaction(id: &str, date: &str, category: &str, amount: f64) -> Value {
    json!({
        "id": id,
        "date": date,
        "merchant": "Pick n Pay",
        "category": category,
        "amount": amount,
        "description": format!("Payment at Pick n Pay ({id})"),
        "paymentMethod": "Debit Card",
        "icon": "shopping-cart",
        "categoryColor": "#00A896"
    })
}

fn transactions_fixture() -> Value {
    json!({
        "transactions": [
            transaction("t1", "2025-01-01T10:00:00Z", "Groceries", 10.0),
            transaction("t2", "2025-01-02T10:00:00Z", "Dining", 30.0),
            transaction("t3", "2025-01-03T10:00:00Z", "Groceries", 20.0),
        ]
    })
}

#[tokio::test]
async fn login_round_trip_with_case_insensitive_email() {
    let app = Router::new().route(
        "/api/customers/customers.json",
        get(|| async { Json(directory_records()) }),
    );
    let client = client_for(serve(app).await);

    let success = auth::authenticate(&client, "THABO@EXAMPLE.CO.ZA", "p1")
        .await
        .unwrap();

    assert_eq!(success.user.id, "u1");
    assert_eq!(customer::customer_id(&success.user), "cust_12345");
    assert_eq!(success.expires_in, 86_400);

    // The token decodes back to the same user.
    let claims = token::validate(&success.token).unwrap();
    assert_eq!(claims.user_id, "u1");

    // Persist, then read the session back like a fresh invocation would.
    let mut store = MemoryStore::new();
    auth::store_session(&mut store, &success.user, &success.token).unwrap();
    assert_eq!(auth::current_user(&mut store), Some(success.user));
    assert!(auth::is_authenticated(&mut store));

    auth::clear_session(&mut store);
    assert!(!auth::is_authenticated(&mut store));
}

#[tokio::test]
async fn directory_data_wrapper_is_accepted() {
    let app = Router::new().route(
        "/api/customers/customers.json",
        get(|| async { Json(json!({ "data": directory_records() })) }),
    );
    let client = client_for(serve(app).await);

    let success = auth::authenticate(&client, "lerato@example.co.za", "p2")
        .await
        .unwrap();
    assert_eq!(success.user.id, "u2");
    // No linked customer record, so the user id stands in.
    assert_eq!(customer::customer_id(&success.user), "u2");
}

#[tokio::test]
async fn bad_credentials_map_to_field_tagged_errors() {
    let app = Router::new().route(
        "/api/customers/customers.json",
        get(|| async { Json(directory_records()) }),
    );
    let client = client_for(serve(app).await);

    let err = auth::authenticate(&client, "thabo@example.co.za", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidPassword));
    assert_eq!(err.field(), Some(AuthField::Password));
    assert_eq!(err.code(), Some("INVALID_PASSWORD"));

    let err = auth::authenticate(&client, "nobody@example.co.za", "p1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmailNotFound));
    assert_eq!(err.field(), Some(AuthField::Email));
}

#[tokio::test]
async fn directory_failure_maps_to_the_generic_auth_error() {
    let app = Router::new().route(
        "/api/customers/customers.json",
        get(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "directory unavailable" })),
            )
        }),
    );
    let client = client_for(serve(app).await);

    let err = auth::authenticate(&client, "thabo@example.co.za", "p1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AuthenticationFailed));
    assert_eq!(err.field(), None);
}

#[tokio::test]
async fn transactions_run_through_the_query_pipeline() {
    let app = Router::new().route(
        "/api/customers/cust_12345/transactions.json",
        get(|| async { Json(transactions_fixture()) }),
    );
    let client = client_for(serve(app).await);

    let page = customer::transactions(
        &client,
        "cust_12345",
        &QuerySpec {
            sort_by: SortBy::AmountAsc,
            limit: Some(10),
            offset: Some(0),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let amounts: Vec<f64> = page.transactions.iter().map(|t| t.amount).collect();
    assert_eq!(amounts, [10.0, 20.0, 30.0]);

    let page = customer::transactions(
        &client,
        "cust_12345",
        &QuerySpec {
            limit: Some(2),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(page.transactions.len(), 2);
    assert_eq!(page.pagination.total, 3);
    assert!(page.pagination.has_more);
    assert_eq!(page.pagination.total_pages, 2);
    assert_eq!(page.pagination.current_page, 1);
}

#[tokio::test]
async fn dashboard_aggregates_every_section() {
    let app = Router::new()
        .route(
            "/api/customers/cust_12345/profile.json",
            get(|| async {
                Json(json!({
                    "customerId": "cust_12345",
                    "name": "Thabo Mokoena",
                    "email": "thabo@example.co.za",
                    "joinDate": "2021-03-15",
                    "accountType": "Premium",
                    "totalSpent": 187450.75,
                    "currency": "ZAR"
                }))
            }),
        )
        .route(
            "/api/customers/cust_12345/spending/summary.json",
            get(|| async {
                Json(json!({
                    "30d": {
                        "period": "30d",
                        "totalSpent": 32890.25,
                        "transactionCount": 87,
                        "averageTransaction": 378.05,
                        "topCategory": "Groceries",
                        "comparedToPrevious": { "spentChange": 5.8, "transactionChange": 12.1 }
                    }
                }))
            }),
        )
        .route(
            "/api/customers/cust_12345/spending/categories.json",
            get(|| async {
                Json(json!({
                    "30d": {
                        "dateRange": { "startDate": "2025-05-15", "endDate": "2025-06-14" },
                        "totalAmount": 32890.25,
                        "categories": [{
                            "name": "Groceries",
                            "amount": 8540.50,
                            "percentage": 26,
                            "transactionCount": 24,
                            "color": "#00A896",
                            "icon": "shopping-cart"
                        }]
                    }
                }))
            }),
        )
        .route(
            "/api/customers/cust_12345/spending/trends.json",
            get(|| async {
                Json(json!({
                    "trends": [
                        { "month": "2024-10", "totalSpent": 15670.25, "transactionCount": 73, "averageTransaction": 214.66 },
                        { "month": "2024-11", "totalSpent": 18450.00, "transactionCount": 82, "averageTransaction": 225.00 },
                        { "month": "2024-12", "totalSpent": 20768.00, "transactionCount": 74, "averageTransaction": 280.65 }
                    ]
                }))
            }),
        )
        .route(
            "/api/customers/cust_12345/transactions.json",
            get(|| async { Json(transactions_fixture()) }),
        )
        .route(
            "/api/customers/cust_12345/goals.json",
            get(|| async {
                Json(json!({
                    "goals": [{
                        "id": "goal_001",
                        "category": "Groceries",
                        "monthlyBudget": 10000,
                        "currentSpent": 8540.50,
                        "percentageUsed": 85.4,
                        "daysRemaining": 8,
                        "status": "warning"
                    }]
                }))
            }),
        )
        .route(
            "/api/customers/cust_12345/filters.json",
            get(|| async {
                Json(json!({
                    "categories": [{ "name": "Groceries", "color": "#00A896", "icon": "shopping-cart" }],
                    "dateRangePresets": [{ "label": "Last 30 days", "value": "30d" }]
                }))
            }),
        );
    let client = client_for(serve(app).await);

    let data = customer::dashboard(&client, "cust_12345", "90d", 2, 2)
        .await
        .unwrap();

    // The requested period is missing from the fixtures, so the summary and
    // breakdown fall back to the 30-day entries.
    assert_eq!(data.summary.period, "30d");
    assert_eq!(data.categories.categories[0].name, "Groceries");

    assert_eq!(data.profile.account_type, "Premium");
    assert_eq!(data.trends.trends.len(), 2);
    assert_eq!(data.trends.metadata.total_months, 3);
    assert_eq!(data.recent_transactions.transactions.len(), 2);
    assert_eq!(data.recent_transactions.pagination.total, 3);
    assert_eq!(data.goals[0].status, "warning");
    assert_eq!(data.filters.date_range_presets[0].value, "30d");
    assert_eq!(data.metadata.customer_id, "cust_12345");
    assert_eq!(data.metadata.period, "90d");
}
