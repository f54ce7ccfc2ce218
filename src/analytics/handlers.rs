//! HTTP handlers for the analytics summary and charts.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error, TransactionType, UserID,
    analytics::{
        category_totals::{CategoryTotal, total_by_category},
        period::{PeriodQuery, PeriodSelector},
        summary::{Summary, summarize},
        timeline::{TimelineBucket, TimelineMode, bucket_timeline},
    },
    timezone::current_year,
    transaction::TransactionSource,
};

/// The state needed for the analytics routes.
#[derive(Debug, Clone)]
pub struct AnalyticsState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// Decides the default year.
    pub local_timezone: String,
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AnalyticsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data for the analytics charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Charts {
    /// Expense totals per category, ordered by category ID.
    pub expenses_by_category: Vec<CategoryTotal>,
    /// Expenses and revenues per day or month.
    pub timeline: Vec<TimelineBucket>,
}

/// Compute the summary of `user_id`'s transactions in the selected period.
///
/// # Errors
///
/// Returns an error if the transactions could not be read from `source`.
pub fn build_summary(
    source: &impl TransactionSource,
    user_id: UserID,
    selector: &PeriodSelector,
) -> Result<Summary, Error> {
    let transactions = source.snapshot(user_id, &selector.date_filter())?;

    Ok(summarize(&transactions))
}

/// Compute the chart data for `user_id`'s transactions in the selected period.
///
/// # Errors
///
/// Returns an error if the transactions or categories could not be read from `source`.
pub fn build_charts(
    source: &impl TransactionSource,
    user_id: UserID,
    selector: &PeriodSelector,
) -> Result<Charts, Error> {
    let transactions = source.snapshot(user_id, &selector.date_filter())?;
    let categories = source.category_lookup()?;

    let expenses_by_category = total_by_category(
        transactions
            .iter()
            .filter(|transaction| transaction.kind == TransactionType::Expense),
        &categories,
    );
    let timeline = bucket_timeline(&transactions, TimelineMode::for_selector(selector));

    Ok(Charts {
        expenses_by_category,
        timeline,
    })
}

/// A route handler for the totals of expenses, revenues and the balance.
pub async fn get_summary(
    State(state): State<AnalyticsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Summary>, Error> {
    let selector = PeriodSelector::parse(&query, current_year(&state.local_timezone)?)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    build_summary(&*connection, user_id, &selector).map(Json)
}

/// A route handler for the expenses by category and the timeline.
pub async fn get_charts(
    State(state): State<AnalyticsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Charts>, Error> {
    let selector = PeriodSelector::parse(&query, current_year(&state.local_timezone)?)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    build_charts(&*connection, user_id, &selector).map(Json)
}

#[cfg(test)]
mod build_tests {
    use std::collections::HashMap;

    use time::{Month, macros::date};

    use crate::{
        Amount, Category, Error, TransactionType, UserID,
        analytics::{
            DateFilter,
            handlers::{build_charts, build_summary},
            period::{Period, PeriodSelector},
        },
        database_id::CategoryId,
        transaction::{Transaction, TransactionSource},
    };

    /// An in-memory source holding one user's transactions.
    struct FakeSource {
        transactions: Vec<Transaction>,
        categories: Vec<Category>,
    }

    impl TransactionSource for FakeSource {
        fn snapshot(
            &self,
            user_id: UserID,
            filter: &DateFilter,
        ) -> Result<Vec<Transaction>, Error> {
            Ok(self
                .transactions
                .iter()
                .filter(|t| t.user_id == user_id && filter.contains(t.date))
                .cloned()
                .collect())
        }

        fn category_lookup(&self) -> Result<HashMap<CategoryId, Category>, Error> {
            Ok(self
                .categories
                .iter()
                .map(|category| (category.id, category.clone()))
                .collect())
        }
    }

    const USER: UserID = UserID::new(1);

    fn transaction(
        id: i64,
        date: time::Date,
        category_id: i64,
        cents: i64,
        kind: TransactionType,
    ) -> Transaction {
        Transaction {
            id,
            user_id: USER,
            date,
            category_id,
            description: String::new(),
            amount: Amount::from_cents(cents),
            kind,
        }
    }

    fn categories() -> Vec<Category> {
        vec![
            Category {
                id: 1,
                name: "Grocery".to_owned(),
                kind: TransactionType::Expense,
                icon: "cart".to_owned(),
            },
            Category {
                id: 2,
                name: "Salary".to_owned(),
                kind: TransactionType::Revenue,
                icon: "wallet".to_owned(),
            },
            Category {
                id: 3,
                name: "Transport".to_owned(),
                kind: TransactionType::Expense,
                icon: "bus".to_owned(),
            },
        ]
    }

    fn january_2024() -> PeriodSelector {
        PeriodSelector {
            period: Period::Monthly,
            month: Some(Month::January),
            year: 2024,
        }
    }

    fn january_scenario() -> FakeSource {
        FakeSource {
            transactions: vec![
                transaction(1, date!(2024 - 01 - 05), 1, 5_000, TransactionType::Expense),
                transaction(2, date!(2024 - 01 - 20), 2, 300_000, TransactionType::Revenue),
            ],
            categories: categories(),
        }
    }

    /// A mix of transactions across two years and another user.
    fn busy_source() -> FakeSource {
        let mut transactions = Vec::new();
        let dates = [
            date!(2023 - 11 - 30),
            date!(2024 - 01 - 01),
            date!(2024 - 01 - 15),
            date!(2024 - 01 - 31),
            date!(2024 - 02 - 29),
            date!(2024 - 06 - 10),
            date!(2024 - 12 - 31),
            date!(2025 - 01 - 01),
        ];

        for (i, date) in dates.into_iter().enumerate() {
            let i = i as i64;
            let kind = if i % 3 == 0 {
                TransactionType::Revenue
            } else {
                TransactionType::Expense
            };
            transactions.push(transaction(i + 1, date, i % 4 + 1, 1_234 * (i + 1), kind));
        }

        let mut other = transaction(99, date!(2024 - 01 - 15), 1, 777, TransactionType::Expense);
        other.user_id = UserID::new(2);
        transactions.push(other);

        FakeSource {
            transactions,
            categories: categories(),
        }
    }

    fn selectors() -> Vec<PeriodSelector> {
        vec![
            january_2024(),
            PeriodSelector {
                period: Period::Yearly,
                month: None,
                year: 2024,
            },
            PeriodSelector {
                period: Period::None,
                month: None,
                year: 2024,
            },
            PeriodSelector {
                period: Period::Monthly,
                month: None,
                year: 2024,
            },
        ]
    }

    #[test]
    fn january_summary() {
        let summary = build_summary(&january_scenario(), USER, &january_2024()).unwrap();

        assert_eq!(summary.total_expenses, Amount::from_cents(5_000));
        assert_eq!(summary.total_revenues, Amount::from_cents(300_000));
        assert_eq!(summary.balance, Amount::from_cents(295_000));
    }

    #[test]
    fn january_charts() {
        let charts = build_charts(&january_scenario(), USER, &january_2024()).unwrap();

        assert_eq!(charts.expenses_by_category.len(), 1);
        assert_eq!(charts.expenses_by_category[0].category, "Grocery");
        assert_eq!(charts.expenses_by_category[0].icon, "cart");
        assert_eq!(
            charts.expenses_by_category[0].amount,
            Amount::from_cents(5_000)
        );

        assert_eq!(charts.timeline.len(), 31);
        for bucket in &charts.timeline {
            let (want_expenses, want_revenues) = match bucket.period.as_str() {
                "5" => (Amount::from_cents(5_000), Amount::ZERO),
                "20" => (Amount::ZERO, Amount::from_cents(300_000)),
                _ => (Amount::ZERO, Amount::ZERO),
            };

            assert_eq!(bucket.expenses, want_expenses, "day {}", bucket.period);
            assert_eq!(bucket.revenues, want_revenues, "day {}", bucket.period);
        }
    }

    #[test]
    fn category_sums_match_summary_expenses() {
        let source = busy_source();

        for selector in selectors() {
            let summary = build_summary(&source, USER, &selector).unwrap();
            let charts = build_charts(&source, USER, &selector).unwrap();

            let category_sum: Amount = charts
                .expenses_by_category
                .iter()
                .map(|total| total.amount)
                .sum();
            assert_eq!(category_sum, summary.total_expenses, "{selector:?}");
        }
    }

    #[test]
    fn timeline_sums_match_summary_for_restricted_periods() {
        let source = busy_source();
        let yearly = PeriodSelector {
            period: Period::Yearly,
            month: None,
            year: 2024,
        };

        for selector in [january_2024(), yearly] {
            let summary = build_summary(&source, USER, &selector).unwrap();
            let charts = build_charts(&source, USER, &selector).unwrap();

            let expenses: Amount = charts.timeline.iter().map(|b| b.expenses).sum();
            let revenues: Amount = charts.timeline.iter().map(|b| b.revenues).sum();
            assert_eq!(expenses, summary.total_expenses, "{selector:?}");
            assert_eq!(revenues, summary.total_revenues, "{selector:?}");
        }
    }

    #[test]
    fn balance_law_holds() {
        let source = busy_source();

        for selector in selectors() {
            let summary = build_summary(&source, USER, &selector).unwrap();

            assert_eq!(
                summary.balance,
                summary.total_revenues - summary.total_expenses
            );
        }
    }

    #[test]
    fn repeated_calls_are_identical() {
        let source = busy_source();

        for selector in selectors() {
            let first = build_charts(&source, USER, &selector).unwrap();
            let second = build_charts(&source, USER, &selector).unwrap();

            assert_eq!(
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap()
            );
        }
    }

    #[test]
    fn unset_period_covers_all_years_but_timeline_only_selected_year() {
        let source = busy_source();
        let selector = PeriodSelector {
            period: Period::None,
            month: None,
            year: 2024,
        };

        let summary = build_summary(&source, USER, &selector).unwrap();
        let charts = build_charts(&source, USER, &selector).unwrap();

        let all_expenses: Amount = source
            .transactions
            .iter()
            .filter(|t| t.user_id == USER && t.kind == TransactionType::Expense)
            .map(|t| t.amount)
            .sum();
        let year_expenses: Amount = source
            .transactions
            .iter()
            .filter(|t| {
                t.user_id == USER && t.kind == TransactionType::Expense && t.date.year() == 2024
            })
            .map(|t| t.amount)
            .sum();
        let timeline_expenses: Amount = charts.timeline.iter().map(|b| b.expenses).sum();

        assert_eq!(summary.total_expenses, all_expenses);
        assert_eq!(timeline_expenses, year_expenses);
        assert_eq!(charts.timeline.len(), 12);
    }

    #[test]
    fn empty_set_gives_zeros() {
        let source = busy_source();
        let selector = PeriodSelector {
            period: Period::Monthly,
            month: Some(Month::March),
            year: 2024,
        };

        let summary = build_summary(&source, USER, &selector).unwrap();
        let charts = build_charts(&source, USER, &selector).unwrap();

        assert_eq!(summary.total_expenses, Amount::ZERO);
        assert_eq!(summary.total_revenues, Amount::ZERO);
        assert_eq!(summary.balance, Amount::ZERO);
        assert!(charts.expenses_by_category.is_empty());
        assert_eq!(charts.timeline.len(), 31);
        assert!(
            charts
                .timeline
                .iter()
                .all(|b| b.expenses == Amount::ZERO && b.revenues == Amount::ZERO)
        );
    }
}
