use clap::{
    Parser,
    Subcommand,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge the fragment spectra of every feature row.
    Merge(MergeArgs),
    /// Write template configuration and input files.
    WriteTemplate(WriteTemplateArgs),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum SerializationFormat {
    Json,
    #[default]
    PrettyJson,
    Ndjson,
}

#[derive(Parser, Debug, Clone)]
pub struct MergeArgs {
    /// The path to the json file with the merge settings,
    /// defaults are used when not given.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// The path to the json file with the feature rows.
    #[arg(short, long)]
    pub input: PathBuf,

    /// The path to the output files.
    #[arg(short, long)]
    pub output_path: PathBuf,

    /// The format to use for the output
    #[arg(short, long, default_value_t, value_enum)]
    pub format: SerializationFormat,

    /// Only write the best merged spectrum of every row.
    #[arg(long, default_value_t = false)]
    pub best_only: bool,

    /// Number of rows merged (in parallel) between progress updates.
    #[arg(long, default_value_t = 1000)]
    pub chunk_size: usize,
}

#[derive(Parser, Debug)]
pub struct WriteTemplateArgs {
    /// The path to the output files.
    #[arg(short, long)]
    pub output_path: PathBuf,
}
