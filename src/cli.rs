use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "class-discovery")]
#[command(about = "List classes under a source root or an autoload snapshot")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Source root walked by direct nesting (defaults to the current directory)
    #[arg(long, value_name = "DIR", conflicts_with = "autoload")]
    pub root: Option<PathBuf>,

    /// JSON autoload snapshot (class map and prefix tables)
    #[arg(long, value_name = "FILE", env = "CLASS_DISCOVERY_AUTOLOAD")]
    pub autoload: Option<PathBuf>,

    /// Namespace of the source root
    #[arg(long, value_name = "NS", requires = "root")]
    pub base_namespace: Option<String>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// List discovered classes
    List {
        #[command(flatten)]
        filters: FilterArgs,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the source file of one class
    Locate { class_name: String },
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    #[arg(long = "namespace", value_name = "NS")]
    pub namespaces: Vec<String>,

    #[arg(long = "not-namespace", value_name = "NS")]
    pub not_namespaces: Vec<String>,

    #[arg(long = "in", value_name = "DIR")]
    pub dirs: Vec<PathBuf>,

    /// Repeat to require several interfaces; comma-separate alternatives
    #[arg(long = "implements", value_name = "NAMES")]
    pub implements: Vec<String>,

    #[arg(long = "extends", value_name = "NAMES")]
    pub extends: Vec<String>,

    #[arg(long = "annotated-by", value_name = "NAMES")]
    pub annotated_by: Vec<String>,

    #[arg(long = "path", value_name = "REGEX")]
    pub path: Option<String>,

    #[arg(long = "not-path", value_name = "REGEX")]
    pub not_path: Option<String>,

    #[arg(long)]
    pub instantiable: bool,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
