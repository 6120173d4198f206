use tracing::debug;

use super::{Translator, quote};
use crate::editor::append_at_end;
use crate::error::GradleditError;
use crate::model::Task;

impl Translator {
    /// Appends a `task` declaration at the end of the script. Tasks cannot be
    /// removed again: there is no stable fragment to locate once declared.
    pub fn insert_task(&self, text: &str, task: &Task) -> Result<String, GradleditError> {
        let is_identifier = task
            .name
            .chars()
            .next()
            .is_some_and(|first| first.is_alphabetic() || first == '_')
            && task
                .name
                .chars()
                .all(|character| character.is_alphanumeric() || character == '_');
        if !is_identifier {
            return Err(GradleditError::InvalidRequest {
                message: format!("Task name '{}' is not a valid identifier", task.name),
            });
        }

        debug!(task = %task.name, "declaring task");
        Ok(append_at_end(text, &self.task_fragment(task)))
    }

    fn task_fragment(&self, task: &Task) -> String {
        let mut arguments = Vec::new();
        if let Some(task_type) = &task.task_type {
            arguments.push(format!("type: {task_type}"));
        }
        match task.depends_on.as_slice() {
            [] => {}
            [single] => arguments.push(format!("dependsOn: {}", quote(single))),
            many => arguments.push(format!(
                "dependsOn: [{}]",
                many.iter().map(|name| quote(name)).collect::<Vec<_>>().join(", ")
            )),
        }

        let mut fragment = format!("task {}", task.name);
        if !arguments.is_empty() {
            fragment.push_str(&format!("({})", arguments.join(", ")));
        }

        if let Some(body) = task.body.as_deref().filter(|body| !body.trim().is_empty()) {
            let indent = self.editor.indent_unit();
            let indented = body
                .trim_end_matches('\n')
                .split('\n')
                .map(|line| {
                    if line.trim().is_empty() {
                        String::new()
                    } else {
                        format!("{indent}{line}")
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");
            fragment.push_str(&format!(" {{\n{indented}\n}}"));
        }
        fragment
    }
}
