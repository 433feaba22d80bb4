pub mod chart;
pub mod history;
pub mod rate_limit;
pub mod stats;
pub mod user;

pub use chart::{PieChart, PieSlice};
pub use history::{distribution_by_day, DayCounts, HistoryEntry};
pub use rate_limit::LoginThrottle;
pub use stats::AggregateStats;
pub use user::{User, UserRecord};
