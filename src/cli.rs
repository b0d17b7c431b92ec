use crate::utils::Result;
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| env!("CARGO_PKG_VERSION").to_string());

#[derive(Parser)]
#[command(name="seqsuite",
          version=&**FULL_VERSION,
          about="Sequence analysis workbench: motif scanning, annotation lookup, alignment, synteny and classification",
          long_about = None,
          disable_help_subcommand = true,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Motif Scanner")]
    Scan(ScanArgs),
    #[clap(about = "Domain Annotation Lookup")]
    Domains(DomainsArgs),
    #[clap(about = "Local Mart Query")]
    Mart(MartArgs),
    #[clap(about = "Multiple Sequence Aligner")]
    Align(AlignArgs),
    #[clap(about = "Synteny Block Detector")]
    Synteny(SyntenyArgs),
    #[clap(about = "Sequence Classifier")]
    Classify(ClassifyArgs),
    #[clap(about = "Structure Superposition")]
    Superpose(SuperposeArgs),
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("scan")))]
#[command(arg_required_else_help(true))]
pub struct ScanArgs {
    #[clap(required = true)]
    #[clap(short = 's')]
    #[clap(long = "seqs")]
    #[clap(help = "FASTA file with sequences to scan")]
    #[clap(value_name = "FASTA")]
    #[arg(value_parser = check_file_exists)]
    pub seqs_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'm')]
    #[clap(long = "motifs")]
    #[clap(help = "Plain-text motif matrix file (columns A C G T)")]
    #[clap(value_name = "MOTIFS")]
    #[arg(value_parser = check_file_exists)]
    pub motifs_path: PathBuf,

    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(help = "Output TSV with motif hits (stdout if omitted)")]
    #[clap(value_name = "TSV")]
    #[arg(value_parser = check_output_path)]
    pub output: Option<PathBuf>,

    #[clap(long = "min-score-frac")]
    #[clap(value_name = "FRAC")]
    #[clap(help = "Minimum hit score as a fraction of the motif's maximum score")]
    #[clap(default_value = "0.8")]
    #[arg(value_parser = ensure_unit_float)]
    pub min_score_frac: f64,

    #[clap(long = "shuffles")]
    #[clap(value_name = "SHUFFLES")]
    #[clap(help = "Number of shuffled backgrounds for enrichment (0 disables)")]
    #[clap(default_value = "100")]
    pub num_shuffles: usize,

    #[clap(long = "seed")]
    #[clap(value_name = "SEED")]
    #[clap(help = "Random seed for background shuffling")]
    #[clap(default_value = "0")]
    pub seed: u64,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,

    #[clap(help_heading("Discovery"))]
    #[clap(long = "discover")]
    #[clap(value_name = "EXE")]
    #[clap(help = "External motif discovery executable, invoked as EXE <fasta> <outdir>")]
    #[arg(value_parser = check_file_exists)]
    pub discover_exe: Option<PathBuf>,

    #[clap(help_heading("Discovery"))]
    #[clap(long = "discover-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help = "Directory where the discovery executable writes its matrices")]
    #[clap(default_value = "discovered_motifs")]
    pub discover_dir: PathBuf,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("domains")))]
#[command(arg_required_else_help(true))]
pub struct DomainsArgs {
    #[clap(required = true)]
    #[clap(short = 'd')]
    #[clap(long = "db")]
    #[clap(help = "Annotation database directory (gene2domain.tsv + domains.tsv)")]
    #[clap(value_name = "DIR")]
    #[arg(value_parser = check_dir_exists)]
    pub db_dir: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'k')]
    #[clap(long = "keytype")]
    #[clap(help = "Identifier type of the query keys")]
    #[clap(value_name = "KEYTYPE")]
    pub keytype: String,

    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(help = "Output TSV (stdout if omitted)")]
    #[clap(value_name = "TSV")]
    #[arg(value_parser = check_output_path)]
    pub output: Option<PathBuf>,

    #[clap(required = true)]
    #[clap(help = "Identifiers to annotate")]
    #[clap(value_name = "KEYS")]
    #[clap(num_args = 1..)]
    pub keys: Vec<String>,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("mart")))]
#[command(arg_required_else_help(true))]
pub struct MartArgs {
    #[clap(required = true)]
    #[clap(short = 'm')]
    #[clap(long = "mart")]
    #[clap(help = "Mart directory with a datasets.json manifest")]
    #[clap(value_name = "DIR")]
    #[arg(value_parser = check_dir_exists)]
    pub mart_dir: PathBuf,

    #[clap(long = "list-datasets")]
    #[clap(help = "List the datasets of the mart and exit")]
    pub list_datasets: bool,

    #[clap(long = "list-attributes")]
    #[clap(value_name = "DATASET")]
    #[clap(help = "List the attributes of a dataset and exit")]
    pub list_attributes: Option<String>,

    #[clap(short = 'd')]
    #[clap(long = "dataset")]
    #[clap(value_name = "DATASET")]
    #[clap(help = "Dataset to query")]
    pub dataset: Option<String>,

    #[clap(short = 'a')]
    #[clap(long = "attributes")]
    #[clap(value_name = "ATTRS")]
    #[clap(help = "Comma-separated attributes to report")]
    #[clap(value_delimiter = ',')]
    pub attributes: Vec<String>,

    #[clap(long = "filter")]
    #[clap(value_name = "ATTR")]
    #[clap(help = "Attribute to filter on")]
    pub filter: Option<String>,

    #[clap(long = "values")]
    #[clap(value_name = "VALUES")]
    #[clap(help = "Comma-separated values the filter attribute must match")]
    #[clap(value_delimiter = ',')]
    pub values: Vec<String>,

    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(help = "Output TSV (stdout if omitted)")]
    #[clap(value_name = "TSV")]
    #[arg(value_parser = check_output_path)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("align")))]
#[command(arg_required_else_help(true))]
pub struct AlignArgs {
    #[clap(required = true)]
    #[clap(short = 's')]
    #[clap(long = "seqs")]
    #[clap(help = "FASTA file with sequences to align (DNA or protein, auto-detected)")]
    #[clap(value_name = "FASTA")]
    #[arg(value_parser = check_file_exists)]
    pub seqs_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-prefix")]
    #[clap(help = "Prefix for output files")]
    #[clap(value_name = "OUTPUT_PREFIX")]
    #[arg(value_parser = check_prefix_path)]
    pub output_prefix: String,

    #[clap(long = "method")]
    #[clap(value_name = "METHOD")]
    #[clap(help = "Tree building method")]
    #[clap(value_parser(["nj", "upgma"]))]
    #[clap(default_value = "nj")]
    pub method: String,

    #[clap(long = "plot")]
    #[clap(value_name = "IMAGE")]
    #[clap(help = "Optional tree plot (.svg, .png, or .pdf)")]
    #[arg(value_parser = check_image_path)]
    pub plot_path: Option<String>,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("synteny")))]
#[command(arg_required_else_help(true))]
pub struct SyntenyArgs {
    #[clap(required = true)]
    #[clap(short = 'd')]
    #[clap(long = "db")]
    #[clap(help = "Sequence database directory (built from --seqs, reopened otherwise)")]
    #[clap(value_name = "DIR")]
    #[arg(value_parser = check_prefix_path)]
    pub db_dir: String,

    #[clap(short = 's')]
    #[clap(long = "seqs")]
    #[clap(help = "FASTA file to build the database from")]
    #[clap(value_name = "FASTA")]
    #[arg(value_parser = check_file_exists)]
    pub seqs_path: Option<PathBuf>,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-prefix")]
    #[clap(help = "Prefix for output files")]
    #[clap(value_name = "OUTPUT_PREFIX")]
    #[arg(value_parser = check_prefix_path)]
    pub output_prefix: String,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,

    #[clap(help_heading("Plotting"))]
    #[clap(long = "plot-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help = "Write one synteny plot per sequence pair into this directory")]
    pub plot_dir: Option<PathBuf>,

    #[clap(help_heading("Plotting"))]
    #[clap(long = "plot-format")]
    #[clap(value_name = "FORMAT")]
    #[clap(help = "Image format for synteny plots")]
    #[clap(value_parser(["svg", "png", "pdf"]))]
    #[clap(default_value = "svg")]
    pub plot_format: String,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "kmer-len")]
    #[clap(value_name = "KMER_LEN")]
    #[clap(help = "Anchor k-mer length")]
    #[clap(default_value = "12")]
    #[arg(value_parser = kmer_in_range)]
    pub kmer_len: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "max-gap")]
    #[clap(value_name = "MAX_GAP")]
    #[clap(help = "Maximum gap between chained anchors")]
    #[clap(default_value = "2000")]
    pub max_gap: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "min-block")]
    #[clap(value_name = "MIN_BLOCK")]
    #[clap(help = "Minimum block span in either sequence")]
    #[clap(default_value = "60")]
    pub min_block: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "min-anchors")]
    #[clap(value_name = "MIN_ANCHORS")]
    #[clap(help = "Minimum number of anchors per block")]
    #[clap(default_value = "2")]
    pub min_anchors: usize,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("classify")))]
#[command(arg_required_else_help(true))]
pub struct ClassifyArgs {
    #[clap(required = true)]
    #[clap(short = 's')]
    #[clap(long = "seqs")]
    #[clap(help = "FASTA file with protein sequences")]
    #[clap(value_name = "FASTA")]
    #[arg(value_parser = check_file_exists)]
    pub seqs_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'l')]
    #[clap(long = "labels")]
    #[clap(help = "Two-column TSV with sequence id and label (1 or -1)")]
    #[clap(value_name = "LABELS")]
    #[arg(value_parser = check_file_exists)]
    pub labels_path: PathBuf,

    #[clap(long = "train-frac")]
    #[clap(value_name = "FRAC")]
    #[clap(help = "Fraction of sequences used for training")]
    #[clap(default_value = "0.75")]
    #[arg(value_parser = ensure_unit_float)]
    pub train_frac: f64,

    #[clap(long = "seed")]
    #[clap(value_name = "SEED")]
    #[clap(help = "Random seed for the split and epoch shuffling")]
    #[clap(default_value = "0")]
    pub seed: u64,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "kmer-len")]
    #[clap(value_name = "KMER_LEN")]
    #[clap(help = "K-mer length of the gapped pair features")]
    #[clap(default_value = "1")]
    pub kmer_len: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "max-pair-gap")]
    #[clap(value_name = "MAX_PAIR_GAP")]
    #[clap(help = "Maximum gap between the two k-mers of a feature")]
    #[clap(default_value = "3")]
    pub max_pair_gap: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "lambda")]
    #[clap(value_name = "LAMBDA")]
    #[clap(help = "Regularization strength")]
    #[clap(default_value = "0.01")]
    pub lambda: f64,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "epochs")]
    #[clap(value_name = "EPOCHS")]
    #[clap(help = "Number of training epochs")]
    #[clap(default_value = "20")]
    pub epochs: usize,

    #[clap(help_heading("Profile"))]
    #[clap(long = "profile")]
    #[clap(value_name = "SEQ_ID")]
    #[clap(help = "Report the per-residue prediction profile of this sequence")]
    pub profile_id: Option<String>,

    #[clap(help_heading("Profile"))]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(help = "Profile TSV (stdout if omitted)")]
    #[clap(value_name = "TSV")]
    #[arg(value_parser = check_output_path)]
    pub output: Option<PathBuf>,

    #[clap(help_heading("Profile"))]
    #[clap(long = "plot")]
    #[clap(value_name = "IMAGE")]
    #[clap(help = "Optional profile plot (.svg, .png, or .pdf)")]
    #[arg(value_parser = check_image_path)]
    pub plot_path: Option<String>,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("superpose")))]
#[command(arg_required_else_help(true))]
pub struct SuperposeArgs {
    #[clap(required = true)]
    #[clap(short = 'f')]
    #[clap(long = "fixed")]
    #[clap(help = "PDB file of the fixed structure")]
    #[clap(value_name = "PDB")]
    #[arg(value_parser = check_file_exists)]
    pub fixed_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'm')]
    #[clap(long = "moving")]
    #[clap(help = "PDB file of the structure to move")]
    #[clap(value_name = "PDB")]
    #[arg(value_parser = check_file_exists)]
    pub moving_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-prefix")]
    #[clap(help = "Prefix for output files")]
    #[clap(value_name = "OUTPUT_PREFIX")]
    #[arg(value_parser = check_prefix_path)]
    pub output_prefix: String,
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_prefix_path(s: &str) -> Result<String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(s.to_string())
}

fn check_output_path(s: &str) -> Result<PathBuf> {
    check_prefix_path(s).map(PathBuf::from)
}

fn check_image_path(s: &str) -> Result<String> {
    let prefix_check = check_prefix_path(s)?;
    let path = Path::new(s);
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("svg") | Some("png") | Some("pdf") => Ok(prefix_check),
        _ => Err("Image must have an extension of .svg, .png, or .pdf".to_string()),
    }
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn kmer_in_range(s: &str) -> Result<usize> {
    let kmer_len: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid k-mer length", s))?;
    if (2..=31).contains(&kmer_len) {
        Ok(kmer_len)
    } else {
        Err("K-mer length must be between 2 and 31".into())
    }
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn check_dir_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.is_dir() {
        Err(format!("Directory does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn ensure_unit_float(s: &str) -> Result<f64> {
    let value = s
        .parse::<f64>()
        .map_err(|e| format!("Could not parse float: {}", e))?;
    if !(0.0..=1.0).contains(&value) {
        Err(format!(
            "The value must be between 0.0 and 1.0, got: {}",
            value
        ))
    } else {
        Ok(value)
    }
}
