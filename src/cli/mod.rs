use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::GradleditConfig;
use crate::error::GradleditError;
use crate::translate::Translator;

pub mod edit;
pub mod effective;
pub mod merge;
pub mod read;
pub mod tree;

#[derive(Debug, Parser)]
#[command(name = "gradledit", version = crate::version())]
#[command(about = "Lossless editor for Groovy Gradle build scripts")]
#[command(
    long_about = "Reads dependencies, plugins, repositories, properties and identity fields from a build script and edits them in place, leaving every other byte untouched."
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "GRADLEDIT_CONFIG",
        value_name = "FILE",
        help = "TOML configuration file"
    )]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Print the project model of a build script")]
    Read(read::ReadArgs),
    #[command(about = "Print the invocation tree of a build script with spans")]
    Tree(tree::TreeArgs),
    #[command(about = "Apply insert/remove operations read as JSON from stdin")]
    Edit(edit::EditArgs),
    #[command(about = "Replay the difference between two models onto a build script")]
    Merge(merge::MergeArgs),
    #[command(about = "Print the parsed XML effective model")]
    Effective(effective::EffectiveArgs),
}

pub fn load_config(path: Option<&Path>) -> Result<GradleditConfig, GradleditError> {
    match path {
        Some(path) => GradleditConfig::load(path),
        None => Ok(GradleditConfig::default()),
    }
}

pub(crate) fn translator_for(config: Option<&Path>) -> Result<Translator, GradleditError> {
    Ok(Translator::new(&load_config(config)?))
}

pub(crate) fn read_text(path: &Path) -> Result<String, GradleditError> {
    fs::read_to_string(path).map_err(|error| GradleditError::io(path, error))
}
