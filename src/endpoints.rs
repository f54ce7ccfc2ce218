//! The API endpoints URIs.

/// Attempt to get a cup of coffee.
pub const COFFEE: &str = "/coffee";
/// The route for registering a new user.
pub const REGISTER_API: &str = "/api/register";
/// The route for logging in and getting a bearer token.
pub const LOG_IN_API: &str = "/api/login";
/// The route for listing and creating the user's transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route for listing and creating categories.
pub const CATEGORIES_API: &str = "/api/categories";
/// The route for the expense/revenue totals over a period.
pub const ANALYTICS_SUMMARY_API: &str = "/api/analytics/summary";
/// The route for the expenses by category and timeline over a period.
pub const ANALYTICS_CHARTS_API: &str = "/api/analytics/charts";
