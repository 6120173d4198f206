use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::cli::read_text;
use crate::error::GradleditError;
use crate::groovy::{InvocationTree, parse};

#[derive(Debug, Args)]
pub struct TreeArgs {
    #[arg(value_name = "FILE", help = "Build script to parse")]
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct TreeResponse {
    pub file: String,
    pub tree: InvocationTree,
}

pub fn run_tree(args: TreeArgs) -> Result<TreeResponse, GradleditError> {
    let text = read_text(&args.file)?;
    Ok(TreeResponse {
        file: args.file.display().to_string(),
        tree: parse(&text),
    })
}
