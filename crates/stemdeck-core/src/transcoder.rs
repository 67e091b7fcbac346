//! MP3 transcoding and stem mixing using FFmpeg

use crate::error::TranscodeError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct Transcoder {
    ffmpeg_path: PathBuf,
    quality: u8,
    timeout: Duration,
}

impl Transcoder {
    pub fn new(ffmpeg_path: PathBuf, quality: u8, timeout: Duration) -> Self {
        Self {
            ffmpeg_path,
            quality,
            timeout,
        }
    }

    /// Convert an audio file to MP3 next to the input.
    ///
    /// `.mp3` inputs come back unchanged. On success the source file is
    /// removed and the new path returned; when FFmpeg produces nothing
    /// usable the original path is returned as-is and the caller keeps
    /// working with the unconverted file.
    pub async fn to_mp3(&self, input: &Path) -> Result<PathBuf, TranscodeError> {
        if input.extension().and_then(|e| e.to_str()) == Some("mp3") {
            return Ok(input.to_path_buf());
        }

        let output = input.with_extension("mp3");
        info!("Transcoding {} to MP3", input.display());

        let quality = self.quality.to_string();
        let code = self
            .run_ffmpeg(|cmd| {
                cmd.arg("-i").arg(input);
                cmd.args(["-codec:a", "libmp3lame", "-qscale:a", &quality]);
                cmd.arg(&output);
            })
            .await;

        // Success is judged by the output file, not the exit code: a
        // non-empty MP3 wins, anything else degrades to the original.
        match code {
            Ok(Some(0)) => {}
            Ok(code) => warn!("ffmpeg exited with {:?} for {}", code, input.display()),
            Err(e) => warn!("ffmpeg did not finish for {}: {}", input.display(), e),
        }

        let usable = match fs::metadata(&output).await {
            Ok(meta) => meta.len() > 0,
            Err(_) => false,
        };

        if usable {
            if let Err(e) = fs::remove_file(input).await {
                warn!("could not remove {} after transcode: {}", input.display(), e);
            }
            debug!("Transcoded to: {}", output.display());
            Ok(output)
        } else {
            warn!(
                "transcode produced no usable output for {}, keeping original",
                input.display()
            );
            let _ = fs::remove_file(&output).await;
            Ok(input.to_path_buf())
        }
    }

    /// Overlay `inputs` into a single MP3 with equal weights, padded to the
    /// longest input.
    pub async fn mix(&self, inputs: &[&Path], output: &Path) -> Result<(), TranscodeError> {
        info!(
            "Mixing {} inputs into {}",
            inputs.len(),
            output.display()
        );

        let filter = format!("amix=inputs={}:duration=longest", inputs.len());
        let quality = self.quality.to_string();
        let code = self
            .run_ffmpeg(|cmd| {
                for input in inputs {
                    cmd.arg("-i").arg(input);
                }
                cmd.args(["-filter_complex", &filter]);
                cmd.args(["-codec:a", "libmp3lame", "-qscale:a", &quality]);
                cmd.arg(output);
            })
            .await?;

        if code != Some(0) {
            return Err(TranscodeError::FfmpegFailed(code));
        }

        debug!("Mixed to: {}", output.display());
        Ok(())
    }

    async fn run_ffmpeg(
        &self,
        build: impl FnOnce(&mut Command),
    ) -> Result<Option<i32>, TranscodeError> {
        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(["-hide_banner", "-loglevel", "error", "-y"]);
        build(&mut cmd);
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn()?;
        match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => Ok(status?.code()),
            Err(_) => Err(TranscodeError::TimedOut(self.timeout.as_secs())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcoder() -> Transcoder {
        Transcoder::new(PathBuf::from("ffmpeg"), 2, Duration::from_secs(30))
    }

    #[tokio::test]
    async fn test_to_mp3_is_idempotent_for_mp3_input() {
        // Already-MP3 inputs short-circuit before FFmpeg is ever spawned.
        let input = PathBuf::from("/nonexistent/drums.mp3");
        let out = transcoder().to_mp3(&input).await.unwrap();
        assert_eq!(out, input);
    }

    #[tokio::test]
    async fn test_to_mp3_case_sensitive_extension() {
        // Extension matching is exact; `.MP3` goes through the transcode
        // path (and degrades to the original here, with no ffmpeg on hand).
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("track.MP3");
        std::fs::write(&input, b"not really audio").unwrap();

        let t = Transcoder::new(dir.path().join("no-such-ffmpeg"), 2, Duration::from_secs(1));
        let out = t.to_mp3(&input).await.unwrap();
        assert_eq!(out, input);
        assert!(input.exists(), "degraded path keeps the original file");
    }
}
