pub mod auth;
pub mod detect;
pub mod health;
pub mod register;
pub mod stats;
pub mod upload;
pub mod validation;

pub use auth::{auth_form, login, logout, session_info};
pub use detect::detect_video;
pub use health::health_check;
pub use register::register_user;
pub use stats::{get_daily_distribution, get_stats};
pub use upload::upload_video;
