//! # vaultview CLI
//!
//! Command-line interface for rendering an Obsidian vault.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use vaultview_core::Visibility;

#[derive(Parser)]
#[command(name = "vaultview")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "vaultview.yml", env = "VAULTVIEW_CONFIG")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one markdown file to HTML
    Render {
        /// Markdown file to render
        file: PathBuf,

        /// Emit `{frontmatter, html}` as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a file's frontmatter as JSON
    Frontmatter {
        /// Markdown file to inspect
        file: PathBuf,
    },

    /// List the documents in the content directory
    Index {
        /// Which documents to include
        #[arg(long, value_enum, default_value_t = VisibilityArg::All)]
        visibility: VisibilityArg,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the content directory as a JSON file tree
    Tree {
        /// Which documents to include
        #[arg(long, value_enum, default_value_t = VisibilityArg::All)]
        visibility: VisibilityArg,
    },
}

#[derive(Copy, Clone, ValueEnum)]
pub enum VisibilityArg {
    All,
    Public,
    Private,
}

impl From<VisibilityArg> for Visibility {
    fn from(arg: VisibilityArg) -> Self {
        match arg {
            VisibilityArg::All => Visibility::All,
            VisibilityArg::Public => Visibility::Public,
            VisibilityArg::Private => Visibility::Private,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for command output
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Render { file, json } => commands::render_file(&cli.config, &file, json),
        Commands::Frontmatter { file } => commands::show_frontmatter(&file),
        Commands::Index { visibility, json } => {
            commands::index_vault(&cli.config, visibility.into(), json)
        }
        Commands::Tree { visibility } => commands::file_tree(&cli.config, visibility.into()),
    }
}
