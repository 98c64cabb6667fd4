use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "benchfold",
    about = "benchfold: interpret benchmark output through a schema and keep a condensed build history",
    version
)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Log at debug level (overridden by BENCHFOLD_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interpret content documents into a result tree
    Interpret {
        /// Schema document (JSON or XML)
        #[arg(long)]
        schema: String,

        /// Build number assigned to the samples
        #[arg(long, default_value_t = 1)]
        build: u32,

        /// Content documents, interpreted as one build
        #[arg(required = true)]
        files: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Condense one build into a summary file and judge it
    Condense {
        /// Schema document (JSON or XML)
        #[arg(long)]
        schema: String,

        /// Build number of the content
        #[arg(long)]
        build: u32,

        /// Summary JSONL (created when missing)
        #[arg(long)]
        summary: String,

        /// Content documents of the build
        #[arg(required = true)]
        files: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rebuild a summary from a directory of numbered builds
    Rebuild {
        /// Schema document (JSON or XML)
        #[arg(long)]
        schema: String,

        /// Directory holding one sub-directory per build number
        #[arg(long)]
        history: String,

        /// Summary JSONL to write
        #[arg(long)]
        summary: String,

        /// Worker threads (default: available parallelism - 1)
        #[arg(long)]
        workers: Option<usize>,

        /// Wall-clock budget in seconds
        #[arg(long)]
        budget_secs: Option<u64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a summary file
    Show {
        /// Summary JSONL
        #[arg(long)]
        summary: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
