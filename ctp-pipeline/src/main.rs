//! Orchestrator binary (§6 "External interfaces"): a single `run`
//! subcommand over one target directory. CLI wrappers are named as an
//! external collaborator in scope, not a surface to grow subcommands on —
//! config, walker, LLM client, and graph wiring all happen here and
//! nowhere else in the workspace.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ctp_core::config::PipelineConfig;
use ctp_core::traits::{FileWalker, LlmClient, PropertyGraph};
use ctp_pipeline::llm::NullLlmClient;
use ctp_pipeline::walker::FsWalker;
use ctp_pipeline::Orchestrator;
use ctp_testkit::InMemoryGraph;

#[derive(Parser)]
#[command(name = "ctp-pipeline", about = "Cognitive Triangulation Pipeline orchestrator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze `target` and print the run report as JSON.
    Run {
        target: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let Command::Run { target, config } = cli.command;

    let config_path = config.as_ref().map(|p| p.to_string_lossy().into_owned());
    let config = match PipelineConfig::from_file_and_env(config_path.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };
    init_tracing(config.effective_json_logs());

    let storage = match ctp_storage::SqliteStorage::open(std::path::Path::new(&config.effective_store_path()), 4) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!(error = %e, "failed to open relational store");
            return ExitCode::from(1);
        }
    };
    let graph: Arc<dyn PropertyGraph> = Arc::new(InMemoryGraph::new());
    let llm: Arc<dyn LlmClient> = Arc::new(NullLlmClient);

    let mut walker: Box<dyn FileWalker> = match FsWalker::new(&target) {
        Ok(w) => Box::new(w),
        Err(e) => {
            tracing::error!(error = %e, "failed to walk target directory");
            return ExitCode::from(1);
        }
    };

    let orchestrator = Orchestrator::new(storage, graph, llm, config);
    let target_str = target.to_string_lossy().into_owned();

    match orchestrator.run(&target_str, walker.as_mut()).await {
        Ok(report) => {
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("failed to serialize run report: {e}"),
            }
            ExitCode::from(report.exit_code as u8)
        }
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
