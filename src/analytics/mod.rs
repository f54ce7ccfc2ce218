//! Analytics over a user's transactions for a period.
//!
//! The period query parameters are parsed into a [PeriodSelector], which gives
//! the date filter for the user's transaction snapshot. The snapshot is then
//! summed into a [Summary], a per-category breakdown and a timeline.

mod category_totals;
mod handlers;
mod period;
mod summary;
mod timeline;

pub use category_totals::{CategoryTotal, total_by_category};
pub use handlers::{Charts, build_charts, build_summary, get_charts, get_summary};
pub use period::{DateFilter, Period, PeriodQuery, PeriodSelector};
pub use summary::{Summary, summarize};
pub use timeline::{TimelineBucket, TimelineMode, bucket_timeline};
