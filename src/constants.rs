/// Default number of frames sampled per video (the classifier's batch length)
pub const DEFAULT_FRAME_COUNT: usize = 10;

/// Default square edge, in pixels, every sampled frame is resized to
pub const DEFAULT_FRAME_SIZE: u32 = 224;

/// Default fake-probability above which a video is labelled "deepfake"
pub const DEFAULT_DETECTION_THRESHOLD: f32 = 0.5;

/// Maximum upload size in bytes (200MB)
pub const MAX_UPLOAD_SIZE_BYTES: usize = 209_715_200;

/// Video container extensions accepted for upload (compared case-insensitively)
pub const ALLOWED_VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov"];

/// Multipart field carrying the uploaded video
pub const UPLOAD_FIELD_NAME: &str = "video";

/// Session lifetime without activity (1 hour)
pub const DEFAULT_SESSION_TTL_SECS: i64 = 3600;

// =============================================================================
// Credentials
// =============================================================================

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Symbols a password may contain (and must contain at least one of)
pub const PASSWORD_SYMBOLS: &str = "@$!%*?&";

/// Maximum username length
pub const MAX_USERNAME_LENGTH: usize = 64;

/// Maximum failed logins per window per username
pub const MAX_FAILED_LOGINS_PER_WINDOW: u32 = 5;

/// Failed login window length (15 minutes)
pub const LOGIN_WINDOW_SECS: i64 = 900;

// =============================================================================
// Charts
// =============================================================================

pub const REAL_LABEL: &str = "Real";
pub const DEEPFAKE_LABEL: &str = "Deepfake";
pub const REAL_COLOR: &str = "#1abc9c";
pub const DEEPFAKE_COLOR: &str = "#e74c3c";

/// Donut hole ratio for pie charts
pub const PIE_HOLE: f32 = 0.4;

// =============================================================================
// Error Messages
// =============================================================================

/// Error message for malformed usernames
pub const ERR_INVALID_USERNAME: &str =
    "Username must be 1-64 characters of letters, digits, '_', '-' or '.'";

/// Error message for weak passwords
pub const ERR_WEAK_PASSWORD: &str = "Password must be at least 8 characters long, include uppercase, lowercase, number, and special character.";

/// Error message for uploads with a disallowed extension
pub const ERR_UNSUPPORTED_VIDEO: &str = "Unsupported video type (allowed: mp4, avi, mov)";

/// Error message when the multipart body has no video field
pub const ERR_MISSING_VIDEO: &str = "Missing video file in upload";

/// Error message for an unparseable date query
pub const ERR_INVALID_DATE: &str = "Date must be formatted as YYYY-MM-DD";
