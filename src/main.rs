mod debug_report;

use billdiff::{classify_verbose_with, run_batch, BatchOptions, BillJob, ContentTree, DiffOverlay, EngineConfig, Walker};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde_json::json;
use debug_report::ColorChoice;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Legislative amendment engine.
///
/// Exit codes: 0 success, 1 runtime error, 2 invalid arguments or config.
#[derive(Parser, Debug)]
#[command(name = "billdiff", version)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, env = "BILLDIFF_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// JSON rule table replacing the built-in rules.
    #[arg(long, global = true, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Version of the code the bills amend.
    #[arg(long, global = true)]
    base_version: Option<u64>,

    /// Version the produced diffs belong to. In a batch, the first bill's;
    /// each later bill takes the next one.
    #[arg(long, global = true)]
    out_version: Option<u64>,

    /// Enactment date (YYYY-MM-DD) for effective-date clauses.
    #[arg(long, global = true)]
    enacted_on: Option<NaiveDate>,

    /// Force ANSI color output.
    #[arg(long, global = true, conflicts_with = "no_color")]
    color: bool,

    /// Disable ANSI color output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify one clause and show which rules fired.
    Classify {
        /// Clause text. Read from stdin when omitted.
        text: Vec<String>,
        /// Print the actions as JSON instead of the report.
        #[arg(long)]
        json: bool,
    },
    /// Apply one bill to a code tree and print the records as JSON.
    Apply {
        #[arg(long, value_name = "FILE")]
        code: PathBuf,
        #[arg(long, value_name = "FILE")]
        bill: PathBuf,
        /// Print a summary report instead of JSON.
        #[arg(long)]
        summary: bool,
    },
    /// Apply many bills in parallel, one JSON line per bill.
    Batch {
        #[arg(long, value_name = "FILE")]
        code: PathBuf,
        #[arg(required = true)]
        bills: Vec<PathBuf>,
        /// Worker threads (default: one per core).
        #[arg(long)]
        workers: Option<usize>,
    },
}

impl Cli {
    /// File settings with command-line flags applied on top.
    fn engine_config(&self) -> billdiff::Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        if let Some(rules) = &self.rules {
            config.rules = Some(rules.clone());
        }
        if let Some(v) = self.base_version {
            config.base_version = v;
        }
        if let Some(v) = self.out_version {
            config.version = v;
        }
        if self.enacted_on.is_some() {
            config.enacted_on = self.enacted_on;
        }
        if let Command::Batch { workers: Some(n), .. } = &self.command {
            config.workers = Some(*n);
        }
        Ok(config)
    }

    fn color(&self) -> ColorChoice {
        match (self.color, self.no_color) {
            (true, _) => ColorChoice::Always,
            (_, true) => ColorChoice::Never,
            _ => ColorChoice::Auto,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let config = match cli.engine_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    };
    init_logging(&config.log);

    let color = cli.color();
    if let Err(err) = run(cli.command, &config, color) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_env("BILLDIFF_LOG").unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn run(command: Command, config: &EngineConfig, color: ColorChoice) -> billdiff::Result<()> {
    let rules = config.rule_table()?;

    match command {
        Command::Classify { text, json } => {
            let input = if text.is_empty() { read_stdin_input()? } else { text.join(" ") };
            let details = classify_verbose_with(&rules, &input);
            if json {
                println!("{}", serde_json::to_string_pretty(&details.actions)?);
            } else {
                debug_report::print_classify(&details, color);
            }
        }
        Command::Apply { code, bill, summary } => {
            let code = ContentTree::load(&code)?;
            let bill_tree = ContentTree::load(&bill)?;
            let out = Walker::new(&rules, &code, config.walk_options()).walk(&bill_tree);
            if summary {
                debug_report::print_walk(&bill.display().to_string(), &out, color);
            } else {
                let doc = json!({ "records": out.records, "diffs": out.diffs, "inserted": out.inserted });
                println!("{}", serde_json::to_string_pretty(&doc)?);
            }
        }
        Command::Batch { code, bills, .. } => {
            let code = ContentTree::load(&code)?;
            let jobs = bills.into_iter().map(BillJob::file).collect();
            let options = BatchOptions { walk: config.walk_options(), workers: config.workers };
            let store = DiffOverlay::new();
            let outcomes = run_batch(&rules, &code, jobs, options, &store)?;

            for outcome in &outcomes {
                let line = match &outcome.result {
                    Ok(out) => json!({
                        "bill": outcome.name,
                        "version": outcome.version_id,
                        "records": out.records,
                        "diffs": out.diffs,
                        "inserted": out.inserted,
                    }),
                    Err(err) => json!({ "bill": outcome.name, "version": outcome.version_id, "error": err.to_string() }),
                };
                println!("{}", serde_json::to_string(&line)?);
            }
            debug_report::print_batch(&outcomes, color);
        }
    }
    Ok(())
}

fn read_stdin_input() -> billdiff::Result<String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}
