use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use stemdeck_core::pipeline::{Pipeline, PipelineRequest, PipelineStage};
use stemdeck_core::Config;

pub async fn run(url: &str, name: &str, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    // Create progress channel
    let (tx, mut rx) = mpsc::channel(32);

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} [{elapsed_precise}] {bar:40.cyan/blue} {msg}",
        )?
        .progress_chars("=>-"),
    );

    // Spawn progress handler
    let progress_handle = tokio::spawn(async move {
        while let Some(stage) = rx.recv().await {
            match stage {
                PipelineStage::Downloading { name } => {
                    pb.set_position(5);
                    pb.set_message(format!("Downloading {name}..."));
                }
                PipelineStage::Separating { name } => {
                    pb.set_position(20);
                    pb.set_message(format!("Separating {name}..."));
                }
                PipelineStage::NormalizingStems { done, total } => {
                    pb.set_position((70 + done * 20 / total) as u64);
                    pb.set_message(format!("Optimizing stems ({done}/{total})..."));
                }
                PipelineStage::Mixing { mix } => {
                    pb.set_position(92);
                    pb.set_message(format!("Mixing {mix}..."));
                }
                PipelineStage::Complete { output, duration } => {
                    pb.set_position(100);
                    pb.finish_with_message(format!(
                        "Done: {} ({:.1}s)",
                        output.display(),
                        duration.as_secs_f32()
                    ));
                }
                PipelineStage::Failed { stage, error } => {
                    pb.abandon_with_message(format!("Failed at {stage}: {error}"));
                }
            }
        }
    });

    // Run pipeline
    let pipeline = Pipeline::new(
        config,
        PipelineRequest {
            url: url.to_string(),
            requested_name: name.to_string(),
        },
        tx,
        CancellationToken::new(),
    );
    let result = pipeline.run().await;

    // Wait for progress handler
    progress_handle.await?;

    match result {
        Ok(output) => {
            println!("\nResult: {}", output.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("\nError: {}", e);
            Err(e.into())
        }
    }
}
