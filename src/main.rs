use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use ragplan::{Config, PlannerApproach, RagApproach, RagOptions, RetrievalMode};

#[derive(Parser)]
#[command(name = "ragplan")]
#[command(about = "Planner-driven question answering over a search index", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(long, global = true, help = "TOML config file")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question
    Ask {
        #[arg(help = "The question to answer")]
        question: String,
        #[arg(long, default_value_t = 3)]
        top: usize,
        #[arg(long, value_enum, default_value_t = Mode::Hybrid)]
        mode: Mode,
        #[arg(long)]
        exclude_category: Option<String>,
        #[arg(long)]
        no_semantic_ranker: bool,
        #[arg(long)]
        semantic_captions: bool,
        #[arg(long, help = "Request a streamed answer")]
        stream: bool,
    },
    /// Print the plan computed for the configured goal
    Plan,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Text,
    Vectors,
    Hybrid,
}

impl From<Mode> for RetrievalMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Text => RetrievalMode::Text,
            Mode::Vectors => RetrievalMode::Vectors,
            Mode::Hybrid => RetrievalMode::Hybrid,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let approach = PlannerApproach::from_config(&config)?;

    match cli.command {
        Commands::Ask {
            question,
            top,
            mode,
            exclude_category,
            no_semantic_ranker,
            semantic_captions,
            stream,
        } => {
            let options = RagOptions {
                top,
                retrieval_mode: mode.into(),
                semantic_ranker: !no_semantic_ranker,
                semantic_captions,
                exclude_category,
                ..Default::default()
            };

            if stream {
                let mut stdout = tokio::io::stdout();
                approach.run_streaming(&question, &options, &mut stdout).await?;
                return Ok(());
            }

            let response = approach.run(&question, &options).await?;
            println!("{}\n", response.answer);
            println!("Plan:\n{}\n", response.prompt);
            println!("Sources:\n{}", response.sources_as_text);
        }
        Commands::Plan => {
            let plan = approach.plan(&RagOptions::default()).await?;
            println!("{}", plan.to_plan_string());
        }
    }

    Ok(())
}
