use clap::{
    Parser,
    Subcommand,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Aggregate the fragment ion evidence of one peptide match.
    Evidence(EvidenceArgs),
    /// Classify PSM and peptide level sites from the localization scores.
    Infer(InferArgs),
    /// Apply manual site toggles, commit them and rescore the proteins.
    Commit(CommitArgs),
    /// Write template configuration files.
    WriteTemplate(WriteTemplateArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct EvidenceArgs {
    /// The path to the json snapshot of the matches.
    #[arg(short, long)]
    pub store_path: PathBuf,

    /// The path to the json file with the precomputed ion annotations.
    #[arg(short, long)]
    pub annotations_path: PathBuf,

    /// The path to the json configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Key of the peptide match to aggregate.
    #[arg(short, long)]
    pub peptide_key: String,

    /// Modification name (or short name) to localize.
    #[arg(short, long)]
    pub modification: String,

    /// Number of copies of the modification to consider, defaults to the
    /// count on the peptide.
    #[arg(short, long)]
    pub n_ptm: Option<usize>,

    /// Quantile reported per cell, overrides the configuration.
    #[arg(short, long)]
    pub quantile: Option<f64>,

    /// Where to write the json output, stdout when missing.
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct InferArgs {
    /// The path to the json snapshot of the matches.
    #[arg(short, long)]
    pub store_path: PathBuf,

    /// The path to the json configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Where to write the updated snapshot.
    #[arg(short, long)]
    pub output_path: PathBuf,

    /// Replace scores already stored on the matches.
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CommitArgs {
    /// The path to the json snapshot of the matches.
    #[arg(short, long)]
    pub store_path: PathBuf,

    /// The path to the json map of protein accessions to sequences.
    #[arg(long)]
    pub sequences_path: PathBuf,

    /// The path to the json configuration file, with an `edit` section.
    #[arg(short, long)]
    pub config: PathBuf,

    /// Directory for the updated snapshot and the commit report.
    #[arg(short, long)]
    pub output_dir: PathBuf,

    /// Rescore the proteins one at a time.
    #[arg(long, default_value_t = false)]
    pub sequential: bool,
}

#[derive(Parser, Debug)]
pub struct WriteTemplateArgs {
    /// The path to the output files.
    #[arg(short, long)]
    pub output_path: PathBuf,
}
