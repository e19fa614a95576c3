use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Concatenate a project's text files into one annotated document"
)]
pub struct Cli {
    /// Name of the project config file, relative to the project root
    #[arg(long, global = true, default_value = crate::app::config::CONFIG_FILE_NAME)]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan the project and write a fresh config file
    Init {
        #[command(flatten)]
        project: ProjectArgs,

        /// Write the default rules without scanning for extensions
        #[arg(long)]
        no_scan: bool,
    },
    /// Add rules for new top-level directories to an existing config
    Discover {
        #[command(flatten)]
        project: ProjectArgs,
    },
    /// Walk the project and write the output document
    Start {
        #[command(flatten)]
        project: ProjectArgs,

        /// Output file, overriding the one in the config
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Count the words in a file
    Count {
        #[arg(default_value = crate::app::config::DEFAULT_OUTPUT_FILE)]
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct ProjectArgs {
    /// Project root (defaults to the current directory)
    #[arg(long, short = 'd')]
    pub dir: Option<PathBuf>,
}
