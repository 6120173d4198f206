use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use crate::cli::{read_text, translator_for};
use crate::effective::{EffectiveProject, parse_effective_model};
use crate::error::GradleditError;
use crate::hash::script_hash;
use crate::model::{ProfileModel, ProjectModel};

#[derive(Debug, Args)]
pub struct ReadArgs {
    #[arg(
        long,
        value_name = "XML",
        help = "Effective model dump produced by the build tool"
    )]
    pub effective: Option<PathBuf>,
    #[arg(
        long = "profile",
        value_name = "NAME=FILE",
        value_parser = parse_profile_script,
        help = "Build script of a named profile (repeatable)"
    )]
    pub profiles: Vec<(String, PathBuf)>,
    #[arg(value_name = "FILE", help = "Build script to read")]
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct ReadResponse {
    pub file: String,
    pub source_hash: String,
    pub model: ProjectModel,
}

fn parse_profile_script(value: &str) -> Result<(String, PathBuf), String> {
    match value.split_once('=') {
        Some((name, file)) if !name.is_empty() && !file.is_empty() => {
            Ok((name.to_string(), PathBuf::from(file)))
        }
        _ => Err(format!("expected NAME=FILE, got '{value}'")),
    }
}

pub fn run_read(args: ReadArgs, config: Option<&Path>) -> Result<ReadResponse, GradleditError> {
    let translator = translator_for(config)?;
    let text = read_text(&args.file)?;
    let mut model = ProjectModel::new(translator.read_model(&text));

    let effective = args
        .effective
        .as_deref()
        .map(|path| read_text(path).and_then(|xml| parse_effective_model(&xml)))
        .transpose()?;

    if let Some(effective) = effective {
        model.profiles = effective
            .profiles
            .into_iter()
            .map(|profile| ProfileModel {
                name: profile.name,
                direct: None,
                effective: profile.project,
            })
            .collect();
        model.effective = Some(effective.project);
    }

    for (name, path) in &args.profiles {
        let direct = translator.read_model(&read_text(path)?);
        match model.profiles.iter_mut().find(|profile| &profile.name == name) {
            Some(profile) => profile.direct = Some(direct),
            None => model.profiles.push(ProfileModel {
                name: name.clone(),
                direct: Some(direct),
                effective: EffectiveProject::default(),
            }),
        }
    }

    Ok(ReadResponse {
        file: args.file.display().to_string(),
        source_hash: script_hash(text.as_bytes()),
        model,
    })
}
