use anyhow::{Context, Result};
use schemars::schema_for;
use stepwise_config::StepwiseConfig;

pub fn cmd_schema() -> Result<()> {
    println!("{}", config_schema()?);
    Ok(())
}

fn config_schema() -> Result<String> {
    let schema = schema_for!(StepwiseConfig);
    serde_json::to_string_pretty(&schema).context("serialize config schema")
}
