//! Video decoding through the `ffprobe` / `ffmpeg` command line tools

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::RgbImage;
use serde::Deserialize;

use crate::detection::frames::{VideoDecoder, VideoSource};

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: u32,
    height: u32,
    /// Counted by `-count_packets`; reliable even when the container omits `nb_frames`
    nb_read_packets: Option<String>,
    nb_frames: Option<String>,
}

impl ProbeStream {
    fn frame_count(&self) -> Option<u64> {
        self.nb_read_packets
            .as_deref()
            .and_then(|n| n.parse().ok())
            .or_else(|| self.nb_frames.as_deref().and_then(|n| n.parse().ok()))
    }
}

/// Largest frame edge accepted from `ffprobe` (16K)
const MAX_FRAME_DIMENSION: u32 = 16_384;

/// Bytes in one rgb24 frame, or `None` on overflow
fn rgb24_frame_bytes(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(3)
}

/// Parse `ffprobe -of json` output into (width, height, frame count)
fn parse_probe(stdout: &[u8]) -> Result<(u32, u32, u64), String> {
    let probe: ProbeOutput =
        serde_json::from_slice(stdout).map_err(|e| format!("Unreadable ffprobe output: {e}"))?;
    let stream = probe
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| "No video stream found".to_string())?;
    let frames = stream
        .frame_count()
        .ok_or_else(|| "Video stream has no frame count".to_string())?;

    let (width, height) = (stream.width, stream.height);
    if width == 0 || height == 0 || width > MAX_FRAME_DIMENSION || height > MAX_FRAME_DIMENSION {
        return Err(format!("Unsupported frame size {width}x{height}"));
    }
    Ok((width, height, frames))
}

/// Decoder backed by external `ffprobe` and `ffmpeg` binaries
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    ffmpeg: String,
    ffprobe: String,
}

impl FfmpegDecoder {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }
}

impl VideoDecoder for FfmpegDecoder {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>, String> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-count_packets",
                "-show_entries",
                "stream=width,height,nb_read_packets,nb_frames",
                "-of",
                "json",
            ])
            .arg(path)
            .output()
            .map_err(|e| format!("Failed to run {}: {e}", self.ffprobe))?;

        if !output.status.success() {
            return Err(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        let (width, height, frame_count) = parse_probe(&output.stdout)?;
        let frame_bytes = rgb24_frame_bytes(width, height)
            .ok_or_else(|| format!("Frame size {width}x{height} overflows"))?;
        tracing::debug!(
            "Probed {:?}: {}x{}, {} frames",
            path,
            width,
            height,
            frame_count
        );

        Ok(Box::new(FfmpegVideo {
            ffmpeg: self.ffmpeg.clone(),
            path: path.to_path_buf(),
            width,
            height,
            frame_bytes,
            frame_count,
        }))
    }
}

/// One probed video file; each frame read is a separate `ffmpeg` invocation
#[derive(Debug)]
pub struct FfmpegVideo {
    ffmpeg: String,
    path: PathBuf,
    width: u32,
    height: u32,
    frame_bytes: usize,
    frame_count: u64,
}

impl FfmpegVideo {
    /// Arguments decoding frame `index` as raw rgb24 at the probed size
    ///
    /// Autorotation is off and the output is scaled to the probed size, so a
    /// rotated stream cannot come out transposed.
    fn frame_args(&self, index: u64) -> Vec<OsString> {
        let filter = format!(
            "select=eq(n\\,{index}),scale={}:{}",
            self.width, self.height
        );

        let mut args: Vec<OsString> = ["-v", "error", "-noautorotate", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(self.path.clone().into_os_string());
        args.extend(
            [
                "-vf",
                filter.as_str(),
                "-frames:v",
                "1",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgb24",
                "pipe:1",
            ]
            .into_iter()
            .map(OsString::from),
        );
        args
    }
}

impl VideoSource for FfmpegVideo {
    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn read_frame(&mut self, index: u64) -> Result<RgbImage, String> {
        let output = Command::new(&self.ffmpeg)
            .args(self.frame_args(index))
            .output()
            .map_err(|e| format!("Failed to run {}: {e}", self.ffmpeg))?;

        if !output.status.success() {
            return Err(format!(
                "ffmpeg failed on frame {index}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        let expected = self.frame_bytes;
        if output.stdout.len() != expected {
            return Err(format!(
                "Frame {index}: got {} bytes, expected {expected}",
                output.stdout.len()
            ));
        }

        RgbImage::from_raw(self.width, self.height, output.stdout)
            .ok_or_else(|| format!("Frame {index}: buffer does not match dimensions"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_counted_packets() {
        let json = br#"{"programs":[],"streams":[{"width":1280,"height":720,"nb_frames":"299","nb_read_packets":"300"}]}"#;
        assert_eq!(parse_probe(json), Ok((1280, 720, 300)));
    }

    #[test]
    fn test_parse_probe_falls_back_to_nb_frames() {
        let json = br#"{"streams":[{"width":640,"height":480,"nb_frames":"42"}]}"#;
        assert_eq!(parse_probe(json), Ok((640, 480, 42)));
    }

    #[test]
    fn test_parse_probe_without_stream() {
        assert!(parse_probe(br#"{"streams":[]}"#).is_err());
        assert!(parse_probe(br#"{}"#).is_err());
        assert!(parse_probe(b"garbage").is_err());
    }

    #[test]
    fn test_parse_probe_rejects_bad_dimensions() {
        let zero = br#"{"streams":[{"width":0,"height":480,"nb_frames":"42"}]}"#;
        assert!(parse_probe(zero).is_err());

        let huge = br#"{"streams":[{"width":4000000000,"height":4000000000,"nb_frames":"42"}]}"#;
        assert!(parse_probe(huge).is_err());

        let limit = br#"{"streams":[{"width":16384,"height":16384,"nb_frames":"1"}]}"#;
        assert_eq!(parse_probe(limit), Ok((16384, 16384, 1)));
    }

    #[test]
    fn test_rgb24_frame_bytes() {
        assert_eq!(rgb24_frame_bytes(1920, 1080), Some(1920 * 1080 * 3));
        assert_eq!(rgb24_frame_bytes(0, 1080), Some(0));
    }

    #[test]
    fn test_frame_args_keep_probed_orientation() {
        let video = FfmpegVideo {
            ffmpeg: "ffmpeg".to_string(),
            path: PathBuf::from("portrait.mp4"),
            width: 1920,
            height: 1080,
            frame_bytes: 1920 * 1080 * 3,
            frame_count: 300,
        };
        let args: Vec<String> = video
            .frame_args(42)
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        let position = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert!(position("-noautorotate") < position("-i"));
        assert_eq!(args[position("-i") + 1], "portrait.mp4");
        assert_eq!(
            args[position("-vf") + 1],
            "select=eq(n\\,42),scale=1920:1080"
        );
        assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
    }

    #[test]
    fn test_missing_binary_is_error() {
        let decoder = FfmpegDecoder::new("/nonexistent/ffmpeg", "/nonexistent/ffprobe");
        assert!(decoder.open(Path::new("video.mp4")).is_err());
    }
}
