//! Stem separation via the demucs CLI
//!
//! Demucs writes stems under `separated/<model>/<track>/` relative to its
//! working directory, so the child process always runs with the configured
//! work root as cwd.

use crate::error::SeparateError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Separator {
    demucs_path: PathBuf,
    model: String,
    work_dir: PathBuf,
    timeout: Duration,
}

impl Separator {
    pub fn new(demucs_path: PathBuf, model: String, work_dir: PathBuf, timeout: Duration) -> Self {
        Self {
            demucs_path,
            model,
            work_dir,
            timeout,
        }
    }

    /// Directory demucs will write the stems for `input` into.
    pub fn output_dir(&self, input: &Path) -> PathBuf {
        let base = input.file_stem().map(|s| s.to_os_string()).unwrap_or_default();
        self.work_dir.join("separated").join(&self.model).join(base)
    }

    /// Run demucs on `input` and return the per-track output directory.
    ///
    /// Non-zero exit is terminal and carries the tool's stderr verbatim; a
    /// zero exit without the expected output directory is terminal too.
    /// Cancellation and the deadline both kill the child process.
    pub async fn separate(
        &self,
        input: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, SeparateError> {
        info!("Separating {} with model {}", input.display(), self.model);

        let mut cmd = Command::new(&self.demucs_path);
        cmd.arg("-n").arg(&self.model).arg(input);
        cmd.current_dir(&self.work_dir);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let child = cmd.spawn()?;

        let output = tokio::select! {
            _ = cancel.cancelled() => return Err(SeparateError::Cancelled),
            result = tokio::time::timeout(self.timeout, child.wait_with_output()) => {
                match result {
                    Ok(output) => output?,
                    Err(_) => return Err(SeparateError::TimedOut(self.timeout.as_secs())),
                }
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(SeparateError::ToolFailed {
                code: output.status.code(),
                stderr,
            });
        }

        let dir = self.output_dir(input);
        if !dir.is_dir() {
            return Err(SeparateError::OutputMissing(dir));
        }

        debug!("Stems written to {}", dir.display());
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_dir_keyed_by_input_stem() {
        let sep = Separator::new(
            PathBuf::from("demucs"),
            "htdemucs".to_string(),
            PathBuf::from("/work"),
            Duration::from_secs(60),
        );
        assert_eq!(
            sep.output_dir(Path::new("/work/src/Test_Song.mp3")),
            PathBuf::from("/work/separated/htdemucs/Test_Song")
        );
    }
}
