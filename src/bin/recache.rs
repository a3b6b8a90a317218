use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use recache::Config;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "recache")]
#[command(about = "Content-addressed web-asset cache builder")]
struct Cli {
    /// Search roots to enumerate for the file registry
    #[arg(required = true)]
    roots: Vec<PathBuf>,

    /// Entry point logical paths, comma-separated (defaults to index.html, tester.html)
    #[arg(long, value_delimiter = ',')]
    entries: Vec<String>,

    /// Output cache directory
    #[arg(long, default_value = "cache")]
    out: PathBuf,

    /// Path to the ignore-list JSON
    #[arg(long, default_value = "recache.ignore")]
    ignore_file: PathBuf,

    /// Path to the not-found report written at the end of the run
    #[arg(long, default_value = "recache.notfound")]
    notfound_file: PathBuf,

    /// Log every emitted file
    #[arg(short, long)]
    verbose: bool,

    /// Log cycle detection as it happens
    #[arg(long)]
    loops: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = Config {
        entries: cli.entries,
        verbose: cli.verbose,
        loops: cli.loops,
        roots: cli.roots,
        out: cli.out,
        ignore_file: cli.ignore_file,
        notfound_file: cli.notfound_file,
    };

    match recache::run(&config) {
        Ok(report) => {
            if !report.not_found.is_empty() {
                tracing::warn!(count = report.not_found.len(), "unresolved references recorded");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(%err, "run failed");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let default_level = if cli.loops {
        "recache=debug"
    } else if cli.verbose {
        "recache=info"
    } else {
        "recache=warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
