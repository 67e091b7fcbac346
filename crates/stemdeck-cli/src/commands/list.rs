use anyhow::Result;
use std::path::Path;
use stemdeck_core::catalog::Catalog;
use stemdeck_core::Config;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;
    let catalog = Catalog::new(config.separated_root());
    let entries = catalog.list()?;

    if entries.is_empty() {
        println!("No processed tracks in {}", catalog.root().display());
        return Ok(());
    }

    for entry in entries {
        let mut files: Vec<String> = entry.stems.iter().map(|s| s.to_string()).collect();
        if entry.has_rhythm_mix {
            files.push("mix".to_string());
        }
        if entry.has_full_mix {
            files.push("mix+voice".to_string());
        }
        println!(
            "{}  {}  [{}]",
            entry.modified.format("%Y-%m-%d %H:%M"),
            entry.name,
            files.join(", ")
        );
    }

    Ok(())
}
