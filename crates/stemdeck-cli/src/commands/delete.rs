use anyhow::{bail, Result};
use std::path::Path;
use stemdeck_core::catalog::Catalog;
use stemdeck_core::Config;

pub async fn run(name: &str, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;
    let catalog = Catalog::new(config.separated_root());

    if catalog.entry(name).is_none() {
        bail!("no such track: {name}");
    }

    catalog.delete(name)?;
    println!("Deleted {name}");
    Ok(())
}
