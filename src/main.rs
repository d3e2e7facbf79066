use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use viewbind::cli;
use viewbind::Result;

#[derive(Parser)]
#[command(name = "viewbind")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validate and render language unit documents", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Binding config file
    #[arg(long, global = true, default_value = "viewbind.toml")]
    config: PathBuf,

    /// Log field extraction details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every language unit of a document and report field errors
    Check {
        /// Document to check
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Exit with an error when any unit has field errors
        #[arg(long)]
        strict: bool,
    },

    /// Print the element for a new language unit
    Render {
        /// Category (Chapter, Paragraph, Sentence, Phrase, Word, Other)
        #[arg(short = 't', long = "type", default_value = "Other")]
        language_type: String,

        /// Unit name
        #[arg(short, long)]
        name: String,

        /// Unit length
        #[arg(short, long, default_value_t = 0)]
        length: i32,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "viewbind=debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    match args.command {
        Commands::Check { file, json, strict } => {
            cli::check::run(&file, &args.config, json, strict)
        }
        Commands::Render {
            language_type,
            name,
            length,
        } => cli::render::run(&language_type, &name, length),
    }
}
