//! Pipeline behavior against stubbed external tools.
//!
//! The stubs are tiny shell scripts standing in for demucs and FFmpeg, so
//! these tests only run on unix.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use stemdeck_core::catalog::Catalog;
use stemdeck_core::error::{SeparateError, StemdeckError};
use stemdeck_core::pipeline::{Pipeline, PipelineRequest};
use stemdeck_core::Config;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Writes a non-empty file at its last argument, like a cooperative ffmpeg.
const FFMPEG_OK: &str = r#"#!/bin/sh
for last in "$@"; do :; done
printf 'mp3-bytes' > "$last"
"#;

/// Produces all four stems where demucs would, then exits cleanly.
const DEMUCS_OK: &str = r#"#!/bin/sh
base=$(basename "$3" .mp3)
dir="separated/htdemucs/$base"
mkdir -p "$dir"
for stem in vocals drums bass other; do
  printf 'wav-bytes' > "$dir/$stem.wav"
done
"#;

/// Leaves a partial stem behind and fails, like a mid-run crash.
const DEMUCS_CRASH: &str = r#"#!/bin/sh
base=$(basename "$3" .mp3)
mkdir -p "separated/htdemucs/$base"
printf 'partial' > "separated/htdemucs/$base/vocals.wav"
echo "CUDA error: out of memory" >&2
exit 1
"#;

/// Claims success without writing anything.
const DEMUCS_SILENT: &str = "#!/bin/sh\nexit 0\n";

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn test_config(work: &Path, demucs_script: &str) -> Config {
    let mut config = Config::default();
    config.storage.work_dir = work.to_path_buf();
    config.paths.ffmpeg = Some(write_script(work, "fake-ffmpeg", FFMPEG_OK));
    config.paths.demucs = Some(write_script(work, "fake-demucs", demucs_script));
    config
}

fn stage_input(config: &Config, name: &str) -> PathBuf {
    let staging = config.staging_dir();
    fs::create_dir_all(&staging).unwrap();
    let input = staging.join(format!("{name}.mp3"));
    fs::write(&input, b"mp3").unwrap();
    input
}

fn pipeline(config: &Config, cancel: CancellationToken) -> Pipeline {
    // Progress events are dropped; sends to a closed channel are ignored.
    let (tx, _rx) = mpsc::channel(64);
    Pipeline::new(
        config.clone(),
        PipelineRequest {
            url: "https://example.com/watch?v=x".to_string(),
            requested_name: "Test Song".to_string(),
        },
        tx,
        cancel,
    )
}

#[tokio::test]
async fn successful_run_produces_stems_and_mixes() {
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(tmp.path(), DEMUCS_OK);
    let input = stage_input(&config, "Test_Song");

    let result_dir = pipeline(&config, CancellationToken::new())
        .process_staged(&input, "Test_Song")
        .await
        .unwrap();

    assert_eq!(result_dir, tmp.path().join("separated/htdemucs/Test_Song"));

    let catalog = Catalog::new(config.separated_root());
    let entry = catalog.entry("Test_Song").unwrap();
    assert!(entry.has_all_stems());
    assert!(entry.has_rhythm_mix);
    assert!(entry.has_full_mix);

    // The staged input is spent and the wav intermediates were replaced.
    assert!(!input.exists());
    assert!(!result_dir.join("vocals.wav").exists());
    assert!(result_dir.join("vocals.mp3").exists());
}

#[tokio::test]
async fn failed_separation_leaves_no_catalog_entry() {
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(tmp.path(), DEMUCS_CRASH);
    let input = stage_input(&config, "Test_Song");

    let err = pipeline(&config, CancellationToken::new())
        .process_staged(&input, "Test_Song")
        .await
        .unwrap_err();

    match err {
        StemdeckError::Separate(SeparateError::ToolFailed { stderr, .. }) => {
            assert!(stderr.contains("CUDA error"), "stderr carried verbatim");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let catalog = Catalog::new(config.separated_root());
    assert!(catalog.entry("Test_Song").is_none());
    assert!(catalog.list().unwrap().is_empty());

    // A failed run keeps the staged input for a retry by hand.
    assert!(input.exists());
}

#[tokio::test]
async fn missing_output_directory_is_terminal() {
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(tmp.path(), DEMUCS_SILENT);
    let input = stage_input(&config, "Test_Song");

    let err = pipeline(&config, CancellationToken::new())
        .process_staged(&input, "Test_Song")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StemdeckError::Separate(SeparateError::OutputMissing(_))
    ));
}

#[tokio::test]
async fn cancelled_run_reports_cancellation() {
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(tmp.path(), "#!/bin/sh\nsleep 5\n");
    let input = stage_input(&config, "Test_Song");

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = pipeline(&config, cancel)
        .process_staged(&input, "Test_Song")
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    let catalog = Catalog::new(config.separated_root());
    assert!(catalog.entry("Test_Song").is_none());
}
