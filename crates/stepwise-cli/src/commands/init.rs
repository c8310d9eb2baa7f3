use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use stepwise_config::StepwiseConfig;
use stepwise_loader::CONFIG_FILE;

pub fn cmd_init() -> Result<()> {
    let path = PathBuf::from(CONFIG_FILE);
    if path.exists() {
        bail!("{CONFIG_FILE} already exists");
    }

    let config = StepwiseConfig::default();
    let json = serde_json::to_string_pretty(&config).context("serialize default config")?;
    fs::write(&path, json).with_context(|| format!("write {CONFIG_FILE}"))?;
    println!("created {:?}", path);

    let migrations = config.migrations_path();
    if !migrations.exists() {
        fs::create_dir_all(&migrations).context("create migrations directory")?;
        println!("created {:?}", migrations);
    }
    Ok(())
}
