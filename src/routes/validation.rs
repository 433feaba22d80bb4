use std::path::Path;

use axum::http::{header, HeaderMap};
use chrono::NaiveDate;

use crate::constants::{ALLOWED_VIDEO_EXTENSIONS, ERR_INVALID_DATE};
use crate::error::{AppError, Result};

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Lowercased extension of an uploaded file name, if it is an allowed video type
pub fn video_extension(file_name: &str) -> Result<String> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or(AppError::UnsupportedVideoType)?;

    if !ALLOWED_VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        tracing::warn!("Rejected upload with extension: {}", ext);
        return Err(AppError::UnsupportedVideoType);
    }
    Ok(ext)
}

/// Final path component of a client-supplied file name, for display only
pub fn display_file_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("video")
        .to_string()
}

/// Parse a `YYYY-MM-DD` query value
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::InvalidInput(ERR_INVALID_DATE.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer  xyz "));
        assert_eq!(bearer_token(&headers), Some("xyz"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_video_extension() {
        assert_eq!(video_extension("clip.mp4").unwrap(), "mp4");
        assert_eq!(video_extension("CLIP.MOV").unwrap(), "mov");
        assert_eq!(video_extension("a.b.avi").unwrap(), "avi");

        assert!(matches!(
            video_extension("clip.mkv"),
            Err(AppError::UnsupportedVideoType)
        ));
        assert!(video_extension("noextension").is_err());
        assert!(video_extension("").is_err());
    }

    #[test]
    fn test_display_file_name_strips_directories() {
        assert_eq!(display_file_name("../../etc/clip.mp4"), "clip.mp4");
        assert_eq!(display_file_name("clip.mp4"), "clip.mp4");
        assert_eq!(display_file_name(""), "video");
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-05-01").unwrap(), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert!(matches!(parse_date("05/01/2024"), Err(AppError::InvalidInput(_))));
    }
}
