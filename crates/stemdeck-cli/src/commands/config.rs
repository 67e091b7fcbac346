use anyhow::Result;
use std::path::Path;
use stemdeck_core::config::Config;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    println!("stemdeck configuration\n");

    println!("[paths]");
    if let Some(ref p) = config.paths.ffmpeg {
        println!("  ffmpeg = {:?}", p);
    } else {
        println!("  ffmpeg = (auto-detect)");
    }
    if let Some(ref p) = config.paths.demucs {
        println!("  demucs = {:?}", p);
    } else {
        println!("  demucs = (auto-detect)");
    }

    println!("\n[storage]");
    println!("  work_dir = {:?}", config.storage.work_dir);
    println!("  staging = {:?}", config.staging_dir());
    println!("  results = {:?}", config.separated_root());

    println!("\n[download]");
    println!("  endpoint = {:?}", config.download.endpoint);
    // Never echo the credential itself
    if config.download.access_token.is_some() {
        println!("  access_token = (set)");
    } else {
        println!("  access_token = (unset)");
    }

    println!("\n[separation]");
    println!("  model = {:?}", config.separation.model);

    println!("\n[transcode]");
    println!("  quality = {}", config.transcode.quality);

    println!("\n[limits]");
    println!("  download_timeout_secs = {}", config.limits.download_timeout_secs);
    println!("  separate_timeout_secs = {}", config.limits.separate_timeout_secs);
    println!("  transcode_timeout_secs = {}", config.limits.transcode_timeout_secs);

    println!("\n[server]");
    println!("  bind = {:?}", config.server.bind);
    println!("  port = {}", config.server.port);

    // Show config file locations
    println!("\nConfig file locations (in priority order):");
    if let Some(p) = config_path {
        println!("  1. {} (specified)", p.display());
    }
    if let Some(config_dir) = dirs::config_dir() {
        println!("  2. {}/stemdeck/config.toml", config_dir.display());
    }
    println!("  3. Environment variables (STEMDECK_*)");

    Ok(())
}
