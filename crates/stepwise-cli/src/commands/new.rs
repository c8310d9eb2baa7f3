use std::fs;

use anyhow::{Context, Result, bail};
use stepwise_config::FileFormat;
use stepwise_core::{UnitSource, parse_identifier};
use stepwise_loader::{DirectorySource, UnitFile, load_config};

use crate::utils::{next_order_key, sanitize_name, unit_filename};

pub fn cmd_new(name: String, format: Option<FileFormat>, message: Option<String>) -> Result<()> {
    let config = load_config()?;
    let name = sanitize_name(&name);
    if name.is_empty() {
        bail!("unit name must contain at least one letter or digit");
    }

    let source = DirectorySource::from_config(&config, None);
    let existing = source
        .identifiers()
        .map_err(|e| anyhow::anyhow!("{e}"))?
        .into_iter()
        .filter_map(|identifier| parse_identifier(&identifier))
        .find(|id| id.name == name);
    if let Some(id) = existing {
        bail!("a unit named '{name}' already exists: {}", id.identifier);
    }

    let order_key = next_order_key(&source)?;
    let format = format.unwrap_or(config.unit_format());

    let dir = source.dir();
    if !dir.exists() {
        fs::create_dir_all(dir).context("create migrations directory")?;
    }
    let path = dir.join(unit_filename(order_key, &name, format));

    let unit = UnitFile::template(message);
    let text = match format {
        FileFormat::Json => serde_json::to_string_pretty(&unit).context("serialize unit file")?,
        FileFormat::Yaml | FileFormat::Yml => {
            serde_yaml::to_string(&unit).context("serialize unit file")?
        }
    };
    fs::write(&path, text).with_context(|| format!("write unit file: {}", path.display()))?;

    println!("Created migration unit: {}", path.display());
    println!("  Version: {}", order_key);
    Ok(())
}
