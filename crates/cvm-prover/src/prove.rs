use anyhow::{anyhow, Context};
use clap::Args;
use cvm_precision::{prove_model, ModelGraph, ProofOutcome, ProverConfig, Z3Backend};
use std::path::Path;
use tracing::debug;

/// General prove options
#[derive(Args, Default)]
#[clap(next_help_heading = "General Options")]
pub struct GeneralConfig {
    /// Set the solver timeout in milliseconds (default: 5000)
    #[clap(name = "timeout", long, short = 't')]
    pub timeout: Option<u64>,

    /// Print the assumption and assertion before proving
    #[clap(name = "show-props", long, short = 's')]
    pub show_props: bool,

    /// Display detailed proving progress
    #[clap(name = "verbose", long, short = 'v')]
    pub verbose: bool,
}

impl GeneralConfig {
    /// Command-line flags take precedence over the config file
    fn apply(&self, mut config: ProverConfig) -> ProverConfig {
        if let Some(timeout) = self.timeout {
            config.timeout_ms = Some(timeout);
        }
        config.show_props |= self.show_props;
        config
    }
}

pub fn execute(
    graph_path: Option<&Path>,
    config_path: Option<&Path>,
    root: Option<&str>,
    general_config: &GeneralConfig,
) -> anyhow::Result<ProofOutcome> {
    let graph_path = graph_path.ok_or_else(|| anyhow!("no model graph given"))?;

    let config = match config_path {
        Some(path) => ProverConfig::load(path)
            .with_context(|| format!("failed to read prover config {}", path.display()))?,
        None => ProverConfig::default(),
    };
    let config = general_config.apply(config);
    debug!("prover config: {:?}", config);

    let mut graph = ModelGraph::load(graph_path)
        .with_context(|| format!("failed to load model graph {}", graph_path.display()))?;
    if let Some(root) = root {
        graph = graph.with_root(root)?;
    }
    debug!("proving node `{}`", graph.root_name());

    let backend = Z3Backend::from_config(&config);
    Ok(prove_model(graph.root(), &backend, config.show_props))
}
