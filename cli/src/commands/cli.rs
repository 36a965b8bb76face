use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "sweep", version, about = "Run a solver over every (i, j) pair of a grid")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file; defaults to ./sweep.toml, then ~/.sweep/config.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct RunArgs {
    /// Maximum concurrent trials (0 = number of CPUs).
    #[arg(long, short = 'w')]
    pub workers: Option<usize>,

    #[arg(long)]
    pub solver_bin: Option<String>,

    #[arg(long, allow_negative_numbers = true)]
    pub i_min: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    pub i_max: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    pub j_min: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    pub j_max: Option<i64>,

    /// Per-trial wall clock limit in seconds (0 = none).
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[arg(long)]
    pub output_dir: Option<String>,

    /// Kill running solvers on Ctrl-C instead of letting them finish.
    #[arg(long)]
    pub kill_on_cancel: bool,

    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate the grid.
    Run(RunArgs),
    /// Print the effective configuration as TOML.
    ShowConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn run_flags_parse() {
        let args = Args::parse_from([
            "sweep",
            "run",
            "--workers",
            "8",
            "--i-min",
            "-2",
            "--j-max",
            "5",
            "--kill-on-cancel",
            "--config",
            "custom.toml",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("custom.toml")));
        let Commands::Run(run) = args.command else {
            panic!("expected run");
        };
        assert_eq!(run.workers, Some(8));
        assert_eq!(run.i_min, Some(-2));
        assert_eq!(run.j_max, Some(5));
        assert_eq!(run.i_max, None);
        assert!(run.kill_on_cancel);
        assert!(!run.no_progress);
    }

    #[test]
    fn show_config_takes_no_run_flags() {
        assert!(Args::try_parse_from(["sweep", "show-config", "--workers", "2"]).is_err());
        let args = Args::parse_from(["sweep", "show-config"]);
        assert!(matches!(args.command, Commands::ShowConfig));
    }
}
