use std::path::PathBuf;

use clap::Args;

use crate::cli::read_text;
use crate::effective::{EffectiveModel, parse_effective_model};
use crate::error::GradleditError;

#[derive(Debug, Args)]
pub struct EffectiveArgs {
    #[arg(value_name = "XML", help = "Effective model dump produced by the build tool")]
    pub file: PathBuf,
}

pub fn run_effective(args: EffectiveArgs) -> Result<EffectiveModel, GradleditError> {
    parse_effective_model(&read_text(&args.file)?)
}
