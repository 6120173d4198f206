use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::apply::{CommitReport, ScriptSession};
use crate::cli::translator_for;
use crate::error::GradleditError;
use crate::model::{Dependency, IdentityField, Plugin, Repository, Task};
use crate::translate::Translator;

#[derive(Debug, Args)]
pub struct EditArgs {
    #[arg(long, help = "Read the edit request JSON from stdin")]
    pub json: bool,
    #[arg(long, help = "Compute the rewritten script without writing it")]
    pub dry_run: bool,
    #[arg(value_name = "FILE", help = "Build script to edit")]
    pub file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditRequest {
    /// Hash from a previous `read`; the edit is refused if the script moved on.
    #[serde(default)]
    pub expected_hash: Option<String>,
    pub operations: Vec<EditOperation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum EditOperation {
    InsertDependency { dependency: Dependency },
    RemoveDependency { dependency: Dependency },
    InsertManagedDependency { dependency: Dependency },
    RemoveManagedDependency { dependency: Dependency },
    InsertPlugin { id: String },
    RemovePlugin { id: String },
    InsertRepository { url: String },
    RemoveRepository { url: String },
    InsertProperty { key: String, value: String },
    RemoveProperty { key: String },
    InsertTask { task: Task },
    SetIdentity {
        field: IdentityField,
        #[serde(default)]
        value: Option<String>,
    },
}

impl EditOperation {
    fn apply(&self, translator: &Translator, text: &str) -> Result<String, GradleditError> {
        match self {
            Self::InsertDependency { dependency } => translator.insert_dependency(text, dependency),
            Self::RemoveDependency { dependency } => translator.remove_dependency(text, dependency),
            Self::InsertManagedDependency { dependency } => {
                translator.insert_managed_dependency(text, dependency)
            }
            Self::RemoveManagedDependency { dependency } => {
                translator.remove_managed_dependency(text, dependency)
            }
            Self::InsertPlugin { id } => translator.insert_plugin(text, &Plugin::new(id)),
            Self::RemovePlugin { id } => translator.remove_plugin(text, &Plugin::new(id)),
            Self::InsertRepository { url } => {
                translator.insert_repository(text, &Repository::new(url))
            }
            Self::RemoveRepository { url } => {
                translator.remove_repository(text, &Repository::new(url))
            }
            Self::InsertProperty { key, value } => translator.insert_property(text, key, value),
            Self::RemoveProperty { key } => translator.remove_property(text, key),
            Self::InsertTask { task } => translator.insert_task(text, task),
            Self::SetIdentity { field, value } => {
                translator.set_identity(text, *field, value.as_deref())
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub operations_applied: usize,
    pub commit: CommitReport,
}

pub fn run_edit(args: EditArgs, config: Option<&Path>) -> Result<EditResponse, GradleditError> {
    if !args.json {
        return Err(GradleditError::InvalidRequest {
            message: "edit reads its operations from stdin; pass --json".to_string(),
        });
    }

    let mut request_body = String::new();
    std::io::stdin()
        .read_to_string(&mut request_body)
        .map_err(|error| GradleditError::StdinRead { source: error })?;
    let request: EditRequest = serde_json::from_str(&request_body)
        .map_err(|error| GradleditError::InvalidJsonRequest { source: error })?;

    let translator = translator_for(config)?;
    let session = ScriptSession::open(&args.file)?;
    session.require_hash(request.expected_hash.as_deref())?;

    let updated = apply_operations(&translator, session.text(), &request.operations)?;
    let commit = session.commit(updated, args.dry_run)?;
    Ok(EditResponse {
        operations_applied: request.operations.len(),
        commit,
    })
}

/// Applies `operations` in order, each against the output of the previous one.
pub fn apply_operations(
    translator: &Translator,
    text: &str,
    operations: &[EditOperation],
) -> Result<String, GradleditError> {
    if operations.is_empty() {
        return Err(GradleditError::InvalidRequest {
            message: "Edit request contains no operations".to_string(),
        });
    }

    operations
        .iter()
        .enumerate()
        .try_fold(text.to_string(), |current, (index, operation)| {
            debug!(index, ?operation, "applying edit operation");
            operation.apply(translator, &current)
        })
}

#[cfg(test)]
mod tests {
    use super::{EditOperation, EditRequest, apply_operations};
    use crate::error::GradleditError;
    use crate::model::IdentityField;
    use crate::translate::Translator;

    #[test]
    fn request_json_maps_onto_operations() {
        let request: EditRequest = serde_json::from_str(
            r#"{
                "operations": [
                    {"op": "insert_dependency", "dependency": {"group": "x", "name": "y", "version": "3.0", "configuration": "testRuntime"}},
                    {"op": "remove_plugin", "id": "java"},
                    {"op": "set_identity", "field": "version", "value": "2.0"}
                ]
            }"#,
        )
        .expect("request should deserialize");

        assert_eq!(request.expected_hash, None);
        assert_eq!(request.operations.len(), 3);
        assert_eq!(
            request.operations[2],
            EditOperation::SetIdentity {
                field: IdentityField::Version,
                value: Some("2.0".to_string()),
            }
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<EditRequest>(
            r#"{"operations": [{"op": "remove_property", "key": "a", "extra": 1}]}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn operations_chain_on_the_rewritten_text() {
        let operations = vec![
            EditOperation::InsertRepository {
                url: "https://r".to_string(),
            },
            EditOperation::RemoveRepository {
                url: "https://r".to_string(),
            },
            EditOperation::InsertProperty {
                key: "answer".to_string(),
                value: "42".to_string(),
            },
        ];
        let updated = apply_operations(&Translator::default(), "version = '1'\n", &operations)
            .expect("operations should apply");
        assert_eq!(updated, "version = '1'\nrepositories {\n}\next.answer = '42'\n");
    }

    #[test]
    fn empty_and_failing_requests_are_errors() {
        assert!(matches!(
            apply_operations(&Translator::default(), "", &[]),
            Err(GradleditError::InvalidRequest { .. })
        ));
        assert!(matches!(
            apply_operations(
                &Translator::default(),
                "",
                &[EditOperation::RemovePlugin {
                    id: "java".to_string()
                }]
            ),
            Err(GradleditError::UnremovableElement { .. })
        ));
    }
}
