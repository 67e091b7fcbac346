use anyhow::Result;
use std::path::Path;
use stemdeck_core::Config;

pub async fn run(bind: Option<String>, port: Option<u16>, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let port = port.unwrap_or(config.server.port);
    stemdeck_web::serve(config, &bind, port).await
}
