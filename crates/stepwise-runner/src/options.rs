use stepwise_config::StepwiseConfig;

/// Settings the runner reads at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Version `latest` migrates to.
    pub target_version: u32,
    /// Emit the progress report.
    pub verbose: bool,
}

impl RunnerOptions {
    pub fn from_config(config: &StepwiseConfig) -> Self {
        Self {
            target_version: config.target_version(),
            verbose: config.verbose,
        }
    }
}
