use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "glshim",
    about = "glshim: tweak-driven wrapper signatures for native API catalogs",
    version
)]
pub struct Cli {
    /// Raise the log filter to debug (RUST_LOG still wins)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate wrapper descriptions for a native catalog
    Generate {
        /// Path to native catalog JSON
        #[arg(long)]
        catalog: String,

        /// Path to a TOML tweak table (defaults to the built-in GL table)
        #[arg(long)]
        tweaks: Option<String>,

        /// Path to glshim.toml (defaults to ./glshim.toml when present)
        #[arg(long)]
        config: Option<String>,

        /// Generate only these functions (repeatable)
        #[arg(long = "function")]
        functions: Vec<String>,

        /// Worker threads (0 = one per core)
        #[arg(long)]
        jobs: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the resolved (copy-merged) descriptor for one function
    Resolve {
        /// Function name
        name: String,

        /// Path to a TOML tweak table (defaults to the built-in GL table)
        #[arg(long)]
        tweaks: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run generation and report only the issues
    Check {
        /// Path to native catalog JSON
        #[arg(long)]
        catalog: String,

        /// Path to a TOML tweak table (defaults to the built-in GL table)
        #[arg(long)]
        tweaks: Option<String>,

        /// Path to glshim.toml (defaults to ./glshim.toml when present)
        #[arg(long)]
        config: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
