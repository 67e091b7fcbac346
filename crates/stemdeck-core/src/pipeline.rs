//! Pipeline orchestration: download, separate, normalize, mix

use crate::catalog::{FULL_MIX_FILE, RHYTHM_MIX_FILE, STEM_NAMES};
use crate::config::Config;
use crate::downloader::Downloader;
use crate::error::{SeparateError, StemdeckError};
use crate::sanitize::resolve_track_name;
use crate::separator::Separator;
use crate::transcoder::Transcoder;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What a pipeline run was asked to do
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub url: String,
    pub requested_name: String,
}

/// Pipeline progress stages
#[derive(Debug, Clone)]
pub enum PipelineStage {
    Downloading { name: String },
    Separating { name: String },
    NormalizingStems { done: usize, total: usize },
    Mixing { mix: MixKind },
    Complete { output: PathBuf, duration: Duration },
    Failed { stage: String, error: String },
}

impl PipelineStage {
    /// Short human label for status displays.
    pub fn label(&self) -> String {
        match self {
            PipelineStage::Downloading { name } => format!("downloading {name}"),
            PipelineStage::Separating { name } => format!("separating {name}"),
            PipelineStage::NormalizingStems { done, total } => {
                format!("optimizing stems ({done}/{total})")
            }
            PipelineStage::Mixing { mix } => format!("mixing {mix}"),
            PipelineStage::Complete { .. } => "complete".to_string(),
            PipelineStage::Failed { stage, .. } => format!("failed during {stage}"),
        }
    }
}

/// The two automatic overlays derived from the stems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixKind {
    /// Drums + bass
    Rhythm,
    /// Vocals + drums + bass
    Full,
}

impl MixKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            MixKind::Rhythm => RHYTHM_MIX_FILE,
            MixKind::Full => FULL_MIX_FILE,
        }
    }
}

impl std::fmt::Display for MixKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MixKind::Rhythm => write!(f, "drums+bass"),
            MixKind::Full => write!(f, "vocals+drums+bass"),
        }
    }
}

/// Which mixes a run can produce, given the stems that made it to MP3.
pub fn planned_mixes(normalized: &HashMap<&'static str, PathBuf>) -> Vec<MixKind> {
    let mut mixes = Vec::new();
    if normalized.contains_key("drums") && normalized.contains_key("bass") {
        mixes.push(MixKind::Rhythm);
        if normalized.contains_key("vocals") {
            mixes.push(MixKind::Full);
        }
    }
    mixes
}

/// Main processing pipeline
pub struct Pipeline {
    config: Config,
    request: PipelineRequest,
    progress_tx: mpsc::Sender<PipelineStage>,
    cancel: CancellationToken,
}

impl Pipeline {
    pub fn new(
        config: Config,
        request: PipelineRequest,
        progress_tx: mpsc::Sender<PipelineStage>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            request,
            progress_tx,
            cancel,
        }
    }

    /// Run the full pipeline; returns the per-track result directory.
    pub async fn run(&self) -> Result<PathBuf, StemdeckError> {
        let start_time = Instant::now();
        let track_name = resolve_track_name(&self.request.requested_name);

        info!("Starting pipeline for {} ({})", track_name, self.request.url);

        let downloader = Downloader::new(
            &self.config.download,
            self.config.staging_dir(),
            self.config.limits.download_timeout(),
        );

        let _ = self
            .progress_tx
            .send(PipelineStage::Downloading {
                name: track_name.clone(),
            })
            .await;

        let staging_path = downloader.staging_path(&self.request.requested_name);
        let download = tokio::select! {
            _ = self.cancel.cancelled() => {
                let _ = fs::remove_file(&staging_path).await;
                return Err(StemdeckError::Cancelled);
            }
            result = downloader.fetch(&self.request.url, &self.request.requested_name) => {
                result.map_err(|e| {
                    let _ = self.progress_tx.try_send(PipelineStage::Failed {
                        stage: "download".to_string(),
                        error: e.to_string(),
                    });
                    e
                })?
            }
        };

        self.separate_and_mix(&download.audio_path, &track_name, start_time)
            .await
    }

    /// Run everything after the download against an already-staged MP3.
    pub async fn process_staged(
        &self,
        audio_path: &Path,
        track_name: &str,
    ) -> Result<PathBuf, StemdeckError> {
        self.separate_and_mix(audio_path, track_name, Instant::now())
            .await
    }

    async fn separate_and_mix(
        &self,
        audio_path: &Path,
        track_name: &str,
        start_time: Instant,
    ) -> Result<PathBuf, StemdeckError> {
        let transcoder = Transcoder::new(
            self.config.ffmpeg_path()?,
            self.config.transcode.quality,
            self.config.limits.transcode_timeout(),
        );
        let separator = Separator::new(
            self.config.demucs_path()?,
            self.config.separation.model.clone(),
            self.config.storage.work_dir.clone(),
            self.config.limits.separate_timeout(),
        );

        // 1. Separate
        let _ = self
            .progress_tx
            .send(PipelineStage::Separating {
                name: track_name.to_string(),
            })
            .await;

        let stems_dir = match separator.separate(audio_path, &self.cancel).await {
            Ok(dir) => dir,
            Err(e) => {
                // A failed run must not leave a partial catalog entry.
                let partial = separator.output_dir(audio_path);
                if partial.is_dir() {
                    let _ = std::fs::remove_dir_all(&partial);
                }
                return Err(match e {
                    SeparateError::Cancelled => StemdeckError::Cancelled,
                    other => {
                        let _ = self.progress_tx.try_send(PipelineStage::Failed {
                            stage: "separate".to_string(),
                            error: other.to_string(),
                        });
                        other.into()
                    }
                });
            }
        };

        // 2. Normalize whichever stems demucs produced; missing stems are
        // skipped, stems that refuse to become MP3 stay behind unmixed.
        let total = STEM_NAMES.len();
        let mut normalized: HashMap<&'static str, PathBuf> = HashMap::new();
        for (done, stem) in STEM_NAMES.iter().enumerate() {
            let _ = self
                .progress_tx
                .send(PipelineStage::NormalizingStems { done, total })
                .await;

            let wav = stems_dir.join(format!("{stem}.wav"));
            let mp3 = stems_dir.join(format!("{stem}.mp3"));
            let source = if wav.is_file() {
                wav
            } else if mp3.is_file() {
                mp3
            } else {
                debug!("stem {} missing, skipping", stem);
                continue;
            };

            match transcoder.to_mp3(&source).await {
                Ok(path) if path.extension().and_then(|e| e.to_str()) == Some("mp3") => {
                    normalized.insert(*stem, path);
                }
                Ok(path) => {
                    warn!("stem {} stayed unconverted at {}", stem, path.display());
                }
                Err(e) => {
                    warn!("transcode failed for stem {}: {}", stem, e);
                }
            }
        }

        // 3. Automatic overlays, only when their ingredients all made it.
        // A failed mix is a gap in the result, not a failed run.
        for mix in planned_mixes(&normalized) {
            let _ = self.progress_tx.send(PipelineStage::Mixing { mix }).await;

            let inputs = match mix {
                MixKind::Rhythm => vec![
                    normalized["drums"].as_path(),
                    normalized["bass"].as_path(),
                ],
                MixKind::Full => vec![
                    normalized["vocals"].as_path(),
                    normalized["drums"].as_path(),
                    normalized["bass"].as_path(),
                ],
            };
            let output = stems_dir.join(mix.file_name());
            if let Err(e) = transcoder.mix(&inputs, &output).await {
                warn!("{} mix failed: {}", mix, e);
            }
        }

        // 4. The staging file is spent either way.
        if let Err(e) = fs::remove_file(audio_path).await {
            warn!(
                "could not remove staging file {}: {}",
                audio_path.display(),
                e
            );
        }

        let duration = start_time.elapsed();
        info!(
            "Pipeline complete: {} ({:.1}s)",
            stems_dir.display(),
            duration.as_secs_f32()
        );

        let _ = self
            .progress_tx
            .send(PipelineStage::Complete {
                output: stems_dir.clone(),
                duration,
            })
            .await;

        Ok(stems_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stems(names: &[&'static str]) -> HashMap<&'static str, PathBuf> {
        names
            .iter()
            .map(|n| (*n, PathBuf::from(format!("/out/{n}.mp3"))))
            .collect()
    }

    #[test]
    fn test_no_mix_without_rhythm_section() {
        assert!(planned_mixes(&stems(&[])).is_empty());
        assert!(planned_mixes(&stems(&["vocals"])).is_empty());
        assert!(planned_mixes(&stems(&["vocals", "drums"])).is_empty());
        assert!(planned_mixes(&stems(&["vocals", "bass", "other"])).is_empty());
    }

    #[test]
    fn test_rhythm_mix_needs_drums_and_bass() {
        assert_eq!(
            planned_mixes(&stems(&["drums", "bass"])),
            vec![MixKind::Rhythm]
        );
        assert_eq!(
            planned_mixes(&stems(&["drums", "bass", "other"])),
            vec![MixKind::Rhythm]
        );
    }

    #[test]
    fn test_full_mix_needs_vocals_too() {
        assert_eq!(
            planned_mixes(&stems(&["vocals", "drums", "bass"])),
            vec![MixKind::Rhythm, MixKind::Full]
        );
    }

    #[test]
    fn test_mix_file_names() {
        assert_eq!(MixKind::Rhythm.file_name(), "mixed_audio.mp3");
        assert_eq!(MixKind::Full.file_name(), "mixed_audio_voice.mp3");
    }
}
