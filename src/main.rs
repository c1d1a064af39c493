use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Embedding recall and feedback-driven adaptation for assistant memory", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "recall.toml", global = true)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the recall database
    Init,

    /// Store an embedding for one item
    Store {
        /// Item category (summary, task, response)
        #[arg(long)]
        category: String,

        /// Item id, unique within the category
        #[arg(long)]
        id: String,

        /// Source text to encode
        #[arg(long)]
        text: String,
    },

    /// Search for similar items by text or by an existing item
    Search {
        /// Query text (encoded on the fly)
        #[arg(long, conflicts_with = "id")]
        text: Option<String>,

        /// Existing item id to use as the query subject
        #[arg(long, requires = "category")]
        id: Option<String>,

        /// Category of the query subject (required with --id)
        #[arg(long)]
        category: Option<String>,

        /// Number of results to return
        #[arg(long, default_value_t = 3)]
        top_k: usize,

        /// Restrict candidates to one category
        #[arg(long)]
        filter: Option<String>,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show embedding counts and encoder-version breakdown
    Stats {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Rebuild or verify the embedding index
    Reindex {
        /// Categories to rebuild (default: all)
        #[arg(long, value_delimiter = ',')]
        categories: Option<Vec<String>>,

        /// Clear existing embeddings before rebuilding
        #[arg(long)]
        clear: bool,

        /// Only verify existing embeddings, don't rebuild
        #[arg(long, conflicts_with = "clear")]
        verify_only: bool,

        /// Only index items without an embedding yet
        #[arg(long, conflicts_with_all = ["clear", "verify_only"])]
        missing_only: bool,

        /// Output the report as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Record scored feedback for one or more items
    Feedback {
        #[arg(long)]
        summary_id: Option<String>,

        #[arg(long)]
        task_id: Option<String>,

        #[arg(long)]
        response_id: Option<String>,

        /// +1 or -1
        #[arg(long, allow_hyphen_values = true)]
        score: i64,

        #[arg(long)]
        comment: Option<String>,
    },

    /// Run the adaptation agent over new feedback
    Adapt {
        /// Show the run-history performance report instead of running
        #[arg(long)]
        report: bool,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show current component weights
    Weights {
        /// Show only this component
        component: Option<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Seed sample summaries, tasks and responses for trying things out
    DemoData,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = recall::Config::load(&cli.config)?;

    match cli.command {
        Commands::Init => commands::init::execute(&config),
        Commands::Store { category, id, text } => {
            commands::store::execute(&config, &category, &id, &text)
        }
        Commands::Search {
            text,
            id,
            category,
            top_k,
            filter,
            json,
        } => commands::search::execute(&config, text, id, category, top_k, filter, json),
        Commands::Stats { json } => commands::stats::execute(&config, json),
        Commands::Reindex {
            categories,
            clear,
            verify_only,
            missing_only,
            json,
        } => commands::reindex::execute(&config, categories, clear, verify_only, missing_only, json),
        Commands::Feedback {
            summary_id,
            task_id,
            response_id,
            score,
            comment,
        } => commands::feedback::execute(&config, summary_id, task_id, response_id, score, comment),
        Commands::Adapt { report, json } => commands::adapt::execute(&config, report, json),
        Commands::Weights { component, json } => {
            commands::weights::execute(&config, component, json)
        }
        Commands::DemoData => commands::demo_data::execute(&config),
    }
}
