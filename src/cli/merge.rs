use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use crate::apply::{CommitReport, ScriptSession};
use crate::cli::{read_text, translator_for};
use crate::error::GradleditError;
use crate::merge::merge;
use crate::model::GradleModel;

#[derive(Debug, Args)]
pub struct MergeArgs {
    #[arg(long, value_name = "JSON", help = "Edited model to write back")]
    pub model: PathBuf,
    #[arg(
        long,
        value_name = "JSON",
        help = "Model the edits were made against (defaults to the script's current model)"
    )]
    pub base: Option<PathBuf>,
    #[arg(long, help = "Compute the rewritten script without writing it")]
    pub dry_run: bool,
    #[arg(value_name = "FILE", help = "Build script to update")]
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct MergeResponse {
    pub commit: CommitReport,
}

fn load_model(path: &Path) -> Result<GradleModel, GradleditError> {
    serde_json::from_str(&read_text(path)?)
        .map_err(|error| GradleditError::InvalidJsonRequest { source: error })
}

pub fn run_merge(args: MergeArgs, config: Option<&Path>) -> Result<MergeResponse, GradleditError> {
    let translator = translator_for(config)?;
    let new = load_model(&args.model)?;
    let base = args.base.as_deref().map(load_model).transpose()?;

    let session = ScriptSession::open(&args.file)?;
    let old = match base {
        Some(base) => base,
        None => translator.read_model(session.text()),
    };

    let updated = merge(&translator, session.text(), &old, &new)?;
    Ok(MergeResponse {
        commit: session.commit(updated, args.dry_run)?,
    })
}
