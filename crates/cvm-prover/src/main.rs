use std::path::PathBuf;

use clap::*;
use colored::Colorize;
use prove::{execute, GeneralConfig};
use tracing::debug;

mod prove;

#[derive(Parser)]
#[clap(
    name = env!("CARGO_BIN_NAME"),
    about = "Proves that a CVM scalar operator graph cannot overflow its declared precision. The graph is read from a TOML file and its root is checked with Z3",
    rename_all = "kebab-case",
    author,
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Args {
    /// Path to the TOML model graph
    #[clap(required_unless_present = "list_ops")]
    pub graph: Option<PathBuf>,

    /// Prover configuration file (TOML)
    #[clap(long = "config", short = 'c')]
    pub config: Option<PathBuf>,

    /// Prove this node instead of the graph's root
    #[clap(long = "root", short = 'r')]
    pub root: Option<String>,

    /// List the registered operators and exit
    #[clap(long = "list-ops")]
    pub list_ops: bool,

    /// General options
    #[clap(flatten)]
    pub general_config: GeneralConfig,
}

fn main() {
    #[cfg(windows)]
    let _ = colored::control::set_virtual_terminal(true);

    let args = Args::parse();

    let level = if args.general_config.verbose {
        log::LevelFilter::Trace
    } else {
        log::LevelFilter::Info
    };
    if let Err(err) = simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
    ) {
        eprintln!("failed to initialize logging: {err}");
    }

    debug!("cvm-prover version: {}", env!("CARGO_PKG_VERSION"));

    if args.list_ops {
        for (name, op) in cvm_precision::registered_ops() {
            println!("{name} (inputs: {})", op.arity());
        }
        return;
    }

    let result = execute(
        args.graph.as_deref(),
        args.config.as_deref(),
        args.root.as_deref(),
        &args.general_config,
    );

    match result {
        Ok(outcome) if outcome.is_proved() => println!("{}", outcome.to_string().green()),
        Ok(outcome) => {
            println!("{}", outcome.to_string().bold().red());
            std::process::exit(2);
        }
        Err(err) => {
            let err = format!("{:?}", err);
            println!("{}", err.bold().red());
            std::process::exit(1);
        }
    }
}
