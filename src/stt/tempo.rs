//! Audio speed-up through ffmpeg's `atempo` filter

use std::path::Path;

use tempfile::NamedTempFile;
use tokio::process::Command;

use crate::{Error, Result};

/// Build an `atempo` filter chain for `multiplier`
///
/// Each `atempo` stage only accepts factors between 0.5 and 2.0, so larger
/// or smaller factors are split across several stages.
#[must_use]
pub fn atempo_filter(multiplier: f32) -> String {
    let mut remaining = f64::from(multiplier);
    let mut stages = Vec::new();

    while remaining > 2.0 {
        stages.push("atempo=2.0".to_string());
        remaining /= 2.0;
    }
    while remaining < 0.5 {
        stages.push("atempo=0.5".to_string());
        remaining /= 0.5;
    }
    if (remaining - 1.0).abs() > f64::EPSILON || stages.is_empty() {
        stages.push(format!("atempo={remaining}"));
    }

    stages.join(",")
}

/// Re-encode `input` at `multiplier` speed into a temporary AAC file
///
/// The file is removed when the returned handle is dropped.
///
/// # Errors
///
/// Returns [`Error::Transcription`] if ffmpeg cannot be run or fails
pub async fn speed_up(ffmpeg: &str, input: &Path, multiplier: f32) -> Result<NamedTempFile> {
    if multiplier <= 0.0 || !multiplier.is_finite() {
        return Err(Error::Transcription(format!(
            "invalid tempo multiplier {multiplier}"
        )));
    }

    let output = tempfile::Builder::new()
        .prefix("tempo_processed_")
        .suffix(".m4a")
        .tempfile()?;

    let filter = atempo_filter(multiplier);
    tracing::debug!(input = %input.display(), filter, "speeding up audio");

    let result = Command::new(ffmpeg)
        .arg("-i")
        .arg(input)
        .args(["-filter:a", &filter, "-c:a", "aac", "-y"])
        .arg(output.path())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| Error::Transcription(format!("failed to run {ffmpeg}: {e}")))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(Error::Transcription(format!(
            "ffmpeg exited with {}: {}",
            result.status,
            stderr.lines().last().unwrap_or_default()
        )));
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atempo_filter_chains_large_factors() {
        assert_eq!(atempo_filter(2.0), "atempo=2");
        assert_eq!(atempo_filter(1.5), "atempo=1.5");
        assert_eq!(atempo_filter(4.0), "atempo=2.0,atempo=2");
        assert_eq!(atempo_filter(3.0), "atempo=2.0,atempo=1.5");
        assert_eq!(atempo_filter(0.25), "atempo=0.5,atempo=0.5");
        assert_eq!(atempo_filter(1.0), "atempo=1");
    }

    #[tokio::test]
    async fn test_speed_up_rejects_bad_multiplier() {
        let result = speed_up("ffmpeg", Path::new("in.m4a"), 0.0).await;
        assert!(matches!(result, Err(Error::Transcription(_))));
    }
}
