use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use insights_cli::auth::{self, session};
use insights_cli::config::Config;
use insights_cli::format::{
    format_currency, format_date, format_percentage, parse_month, period_label, DateStyle,
};
use insights_cli::models::{SpendingGoal, UserPublic};
use insights_cli::query::{QuerySpec, SortBy, TransactionPage};
use insights_cli::services::customer::{self, DashboardData, SpendingTrends};
use insights_cli::services::ApiClient;
use insights_cli::storage::{FileStore, SessionStore};

#[derive(Parser)]
#[command(name = "insights", about = "Spending insights from your terminal", version)]
struct Cli {
    /// Print raw JSON instead of formatted output.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and persist the session.
    Login {
        #[arg(long)]
        email: String,
        /// Password; prompted for when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// Drop the stored session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// List transactions with filters, sorting, and paging.
    Transactions {
        #[arg(long)]
        category: Option<String>,
        /// Earliest transaction date (YYYY-MM-DD, inclusive).
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Latest transaction date (YYYY-MM-DD, inclusive).
        #[arg(long)]
        to: Option<NaiveDate>,
        /// date_asc, date_desc, amount_asc, or amount_desc.
        #[arg(long, default_value = "date_desc")]
        sort: SortBy,
        #[arg(long, default_value_t = 20)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
        /// Also write the page to a CSV file.
        #[arg(long, value_name = "PATH")]
        export: Option<PathBuf>,
    },
    /// Spending summary for a period (7d, 30d, 90d, 1y).
    Summary {
        #[arg(long, default_value = "30d")]
        period: String,
    },
    /// Spending broken down by category.
    Categories {
        #[arg(long, default_value = "30d")]
        period: String,
    },
    /// Monthly spending trend.
    Trends {
        #[arg(long, default_value_t = 12)]
        months: usize,
    },
    /// Budget goals and how they are tracking.
    Goals,
    /// The full dashboard in one call.
    Dashboard {
        #[arg(long, default_value = "30d")]
        period: String,
        #[arg(long, default_value_t = 12)]
        months: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("insights_cli=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    if config.maintenance {
        println!("Spending Insights is down for scheduled maintenance. Please try again later.");
        return Ok(());
    }

    let mut store = FileStore::open(&config.session_file);
    let client = ApiClient::new(&config);

    match cli.command {
        Command::Login { email, password } => login(&client, &mut store, &email, password).await,
        Command::Logout => {
            auth::clear_session(&mut store);
            println!("Signed out.");
            Ok(())
        }
        Command::Whoami => whoami(&mut store, cli.json),
        data_command => {
            // Every data command needs a live session. Expiry downgrades to
            // a sign-in prompt rather than an error dump.
            let Some(user) = auth::current_user(&mut store) else {
                println!("Not signed in, or your session has expired. Sign in with `insights login`.");
                std::process::exit(1);
            };
            let token = store.get(session::TOKEN_KEY).unwrap_or_default();
            let client = client.with_bearer_token(token);

            run_data_command(data_command, &client, &user, cli.json).await
        }
    }
}

async fn login(
    client: &ApiClient,
    store: &mut dyn SessionStore,
    email: &str,
    password: Option<String>,
) -> anyhow::Result<()> {
    let password = match password {
        Some(p) => p,
        None => rpassword::prompt_password("Password: ").context("failed to read password")?,
    };

    match auth::authenticate(client, email, &password).await {
        Ok(success) => {
            auth::store_session(store, &success.user, &success.token)?;
            println!(
                "Signed in as {} <{}>. Session valid for {} hours.",
                success.user.name,
                success.user.email,
                success.expires_in / 3600
            );
            Ok(())
        }
        Err(e) => {
            // Field-tagged failures highlight the offending input inline.
            match e.field() {
                Some(field) => eprintln!("{field}: {e}"),
                None => eprintln!("{e}"),
            }
            std::process::exit(1);
        }
    }
}

fn whoami(store: &mut dyn SessionStore, json: bool) -> anyhow::Result<()> {
    match auth::current_user(store) {
        Some(user) if json => print_json(&user),
        Some(user) => {
            println!(
                "Signed in as {} <{}> (customer {})",
                user.name,
                user.email,
                customer::customer_id(&user)
            );
            Ok(())
        }
        None => {
            println!("Not signed in.");
            Ok(())
        }
    }
}

async fn run_data_command(
    command: Command,
    client: &ApiClient,
    user: &UserPublic,
    json: bool,
) -> anyhow::Result<()> {
    let id = customer::customer_id(user);

    match command {
        Command::Transactions {
            category,
            from,
            to,
            sort,
            limit,
            offset,
            export,
        } => {
            let spec = QuerySpec {
                limit: Some(limit),
                offset: Some(offset),
                category,
                start_date: from,
                end_date: to,
                sort_by: sort,
            };
            let page = customer::transactions(client, id, &spec).await?;

            if let Some(path) = export {
                export_csv(&page, &path)?;
                println!("Wrote {} transactions to {}.", page.transactions.len(), path.display());
            }
            if json {
                print_json(&page)?;
            } else {
                render_transactions(&page);
            }
        }
        Command::Summary { period } => {
            let summary = customer::spending_summary(client, id, &period).await?;
            if json {
                print_json(&summary)?;
            } else {
                println!("Spending summary ({})", period_label(&summary.period));
                println!("  Total spent          {}", format_currency(summary.total_spent, true));
                println!("  Transactions         {}", summary.transaction_count);
                println!(
                    "  Average transaction  {}",
                    format_currency(summary.average_transaction, true)
                );
                println!("  Top category         {}", summary.top_category);
                println!(
                    "  vs previous period   {} spend, {} volume",
                    format_percentage(summary.compared_to_previous.spent_change, true),
                    format_percentage(summary.compared_to_previous.transaction_change, true)
                );
            }
        }
        Command::Categories { period } => {
            let breakdown = customer::spending_categories(client, id, &period).await?;
            if json {
                print_json(&breakdown)?;
            } else {
                println!(
                    "Spending by category, {} to {}",
                    breakdown.date_range.start_date, breakdown.date_range.end_date
                );
                for category in &breakdown.categories {
                    println!(
                        "  {:<14} {:>14}  {:>6}  ({} transactions)",
                        category.name,
                        format_currency(category.amount, true),
                        format_percentage(category.percentage, false),
                        category.transaction_count
                    );
                }
                println!("  {:<14} {:>14}", "Total", format_currency(breakdown.total_amount, true));
            }
        }
        Command::Trends { months } => {
            let trends = customer::spending_trends(client, id, months).await?;
            if json {
                print_json(&trends)?;
            } else {
                render_trends(&trends);
            }
        }
        Command::Goals => {
            let goals = customer::spending_goals(client, id).await?;
            if json {
                print_json(&goals)?;
            } else {
                render_goals(&goals);
            }
        }
        Command::Dashboard { period, months } => {
            let data = customer::dashboard(client, id, &period, months, 10).await?;
            if json {
                print_json(&data)?;
            } else {
                render_dashboard(&data);
            }
        }
        Command::Login { .. } | Command::Logout | Command::Whoami => {
            unreachable!("handled before dispatch")
        }
    }

    Ok(())
}

fn render_transactions(page: &TransactionPage) {
    if page.transactions.is_empty() {
        println!("No matching transactions.");
        return;
    }

    println!(
        "{:<12} {:<22} {:<14} {:>14}  {}",
        "DATE", "MERCHANT", "CATEGORY", "AMOUNT", "PAYMENT"
    );
    for tx in &page.transactions {
        println!(
            "{:<12} {:<22} {:<14} {:>14}  {}",
            format_date(tx.date, DateStyle::Short),
            tx.merchant,
            tx.category,
            format_currency(tx.amount, true),
            tx.payment_method
        );
    }

    let p = &page.pagination;
    println!(
        "\nPage {} of {}, {} matching transaction{}{}",
        p.current_page,
        p.total_pages,
        p.total,
        if p.total == 1 { "" } else { "s" },
        if p.has_more { " (more available)" } else { "" }
    );
}

fn render_trends(trends: &SpendingTrends) {
    println!(
        "Monthly spend, last {} of {} months",
        trends.trends.len(),
        trends.metadata.total_months
    );
    for trend in &trends.trends {
        let label = parse_month(&trend.month)
            .map(|d| format_date(d.and_time(chrono::NaiveTime::MIN).and_utc(), DateStyle::Month))
            .unwrap_or_else(|| trend.month.clone());
        println!(
            "  {:<9} {:>14}  ({} transactions, avg {})",
            label,
            format_currency(trend.total_spent, true),
            trend.transaction_count,
            format_currency(trend.average_transaction, true)
        );
    }
}

fn render_goals(goals: &[SpendingGoal]) {
    if goals.is_empty() {
        println!("No spending goals set.");
        return;
    }

    println!("Budget goals");
    for goal in goals {
        let marker = if goal.status == "warning" { "!" } else { " " };
        println!(
            "{} {:<14} {:>14} of {:>14}  ({}, {} days left)",
            marker,
            goal.category,
            format_currency(goal.current_spent, true),
            format_currency(goal.monthly_budget, true),
            format_percentage(goal.percentage_used, false),
            goal.days_remaining
        );
    }
}

fn render_dashboard(data: &DashboardData) {
    println!(
        "{} ({} account, customer since {})",
        data.profile.name, data.profile.account_type, data.profile.join_date
    );
    println!(
        "{} spent all-time ({})\n",
        format_currency(data.profile.total_spent, true),
        data.profile.currency
    );

    println!("Summary, {}", period_label(&data.summary.period));
    println!(
        "  {} across {} transactions ({} vs previous)\n",
        format_currency(data.summary.total_spent, true),
        data.summary.transaction_count,
        format_percentage(data.summary.compared_to_previous.spent_change, true)
    );

    println!("Top categories");
    for category in data.categories.categories.iter().take(3) {
        println!(
            "  {:<14} {:>14}  {}",
            category.name,
            format_currency(category.amount, true),
            format_percentage(category.percentage, false)
        );
    }
    println!();

    render_goals(&data.goals);
    println!();

    println!("Recent transactions");
    render_transactions(&data.recent_transactions);
}

fn export_csv(page: &TransactionPage, path: &std::path::Path) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("could not create {}", path.display()))?;

    writer.write_record([
        "id",
        "date",
        "merchant",
        "category",
        "amount",
        "description",
        "payment_method",
    ])?;
    for tx in &page.transactions {
        let date = tx.date.to_rfc3339();
        let amount = format!("{:.2}", tx.amount);
        writer.write_record([
            tx.id.as_str(),
            date.as_str(),
            tx.merchant.as_str(),
            tx.category.as_str(),
            amount.as_str(),
            tx.description.as_str(),
            tx.payment_method.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
