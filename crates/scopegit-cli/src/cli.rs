use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "scopegit",
    about = "Diagnostics for the scopegit version-control sidebar",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Session settings (TOML). Defaults apply when omitted.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Normalize a canonical path
    Normalize(NormalizeArgs),
    /// Resolve a sequence of paths, right to left
    Resolve(ResolveArgs),
    /// Translate a storage locator to a canonical path
    UriToPath(UriToPathArgs),
    /// Translate a canonical path to a storage locator
    PathToUri(PathToUriArgs),
    /// Show the status classification of a head-workdir-stage triple
    Classify(ClassifyArgs),
    /// Print the repository folder name a clone URL implies
    RepoName(RepoNameArgs),
    /// Print the effective session settings
    Config,
    /// List a directory through the scoped filesystem
    Ls(LsArgs),
    /// Print a file through the scoped filesystem
    Cat(CatArgs),
}

#[derive(Args)]
pub struct NormalizeArgs {
    pub path: String,
}

#[derive(Args)]
pub struct ResolveArgs {
    #[arg(required = true)]
    pub paths: Vec<String>,
}

#[derive(Args)]
pub struct UriToPathArgs {
    pub locator: String,
}

#[derive(Args)]
pub struct PathToUriArgs {
    pub path: String,
    /// Active working root used to pick the locator form
    #[arg(long)]
    pub root: Option<String>,
}

#[derive(Args)]
pub struct ClassifyArgs {
    /// Triple in head-workdir-stage form, e.g. 1-2-1
    pub triple: Option<String>,
    /// Print the whole table
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct RepoNameArgs {
    pub url: String,
}

#[derive(Args)]
pub struct LsArgs {
    pub path: String,
    /// Directory on disk that stands in for the device root
    #[arg(long, default_value = ".")]
    pub base: PathBuf,
}

#[derive(Args)]
pub struct CatArgs {
    pub path: String,
    /// Directory on disk that stands in for the device root
    #[arg(long, default_value = ".")]
    pub base: PathBuf,
}
