use std::env;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_DETECTION_THRESHOLD, DEFAULT_FRAME_COUNT, DEFAULT_FRAME_SIZE,
    DEFAULT_SESSION_TTL_SECS, MAX_UPLOAD_SIZE_BYTES,
};

/// Channel order of the pixels handed to the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    /// OpenCV's native order, which the bundled model was trained on
    Bgr,
}

impl FromStr for ChannelOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rgb" => Ok(ChannelOrder::Rgb),
            "bgr" => Ok(ChannelOrder::Bgr),
            other => Err(format!("Invalid FRAME_CHANNEL_ORDER: {other}")),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_path: String,
    pub allowed_origins: Vec<String>,
    pub environment: String,
    pub classifier_url: String,
    pub classifier_timeout_secs: u64,
    pub detection_threshold: f32,
    pub frame_count: usize,
    pub frame_size: u32,
    pub channel_order: ChannelOrder,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub max_upload_bytes: usize,
    pub session_ttl_secs: i64,
    pub log_requests: bool,
}

/// Read a variable, falling back to `default`, and parse it
fn parse_var<T: FromStr>(name: &str, default: &str) -> Result<T, String> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| format!("Invalid {name}"))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = parse_var("SERVER_PORT", "8080")?;

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/detector.db".to_string());

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let classifier_url = env::var("CLASSIFIER_URL")
            .map_err(|_| "CLASSIFIER_URL must be set to the model's REST endpoint")?
            .trim_end_matches('/')
            .to_string();
        let classifier_timeout_secs = parse_var("CLASSIFIER_TIMEOUT_SECS", "60")?;

        let detection_threshold: f32 = parse_var(
            "DETECTION_THRESHOLD",
            &DEFAULT_DETECTION_THRESHOLD.to_string(),
        )?;
        if !(0.0..=1.0).contains(&detection_threshold) {
            return Err("DETECTION_THRESHOLD must be within [0, 1]".to_string());
        }

        let frame_count: usize = parse_var("FRAME_COUNT", &DEFAULT_FRAME_COUNT.to_string())?;
        if frame_count == 0 {
            return Err("FRAME_COUNT must be positive".to_string());
        }

        let frame_size: u32 = parse_var("FRAME_SIZE", &DEFAULT_FRAME_SIZE.to_string())?;
        if frame_size == 0 {
            return Err("FRAME_SIZE must be positive".to_string());
        }

        let channel_order = env::var("FRAME_CHANNEL_ORDER")
            .unwrap_or_else(|_| "bgr".to_string())
            .parse()?;

        let ffmpeg_path = env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string());
        let ffprobe_path = env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string());

        let max_upload_bytes =
            parse_var("MAX_UPLOAD_BYTES", &MAX_UPLOAD_SIZE_BYTES.to_string())?;
        let session_ttl_secs =
            parse_var("SESSION_TTL_SECS", &DEFAULT_SESSION_TTL_SECS.to_string())?;
        let log_requests = parse_var("LOG_REQUESTS", "false")?;

        Ok(Config {
            server_host,
            server_port,
            database_path,
            allowed_origins,
            environment,
            classifier_url,
            classifier_timeout_secs,
            detection_threshold,
            frame_count,
            frame_size,
            channel_order,
            ffmpeg_path,
            ffprobe_path,
            max_upload_bytes,
            session_ttl_secs,
            log_requests,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_order_parse() {
        assert_eq!("bgr".parse::<ChannelOrder>(), Ok(ChannelOrder::Bgr));
        assert_eq!(" RGB ".parse::<ChannelOrder>(), Ok(ChannelOrder::Rgb));
        assert!("yuv".parse::<ChannelOrder>().is_err());
    }
}
