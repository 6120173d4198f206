use tracing::debug;

use super::{Translator, quote};
use crate::editor::{append_at_end, remove_span_with_line, replace_span};
use crate::error::GradleditError;
use crate::groovy::{InvocationTree, ROOT, parse};
use crate::model::IdentityField;

pub(super) fn value_of(tree: &InvocationTree, field: IdentityField) -> Option<String> {
    tree.assignment_at(ROOT, field.target_path())
        .map(|assignment| assignment.literal_value.clone())
}

impl Translator {
    pub fn get_identity(&self, text: &str, field: IdentityField) -> Option<String> {
        value_of(&parse(text), field)
    }

    /// Overwrites the root assignment of `field` in place, appends one when
    /// the script has none, and removes it when `value` is `None`.
    pub fn set_identity(
        &self,
        text: &str,
        field: IdentityField,
        value: Option<&str>,
    ) -> Result<String, GradleditError> {
        let tree = parse(text);
        let existing = tree.assignment_at(ROOT, field.target_path());
        let statement = value.map(|value| format!("{} = {}", field.target_path(), quote(value)));

        debug!(?field, ?value, "setting identity field");
        match (existing, statement) {
            (Some(assignment), Some(statement)) => replace_span(text, &assignment.span, &statement),
            (Some(assignment), None) => remove_span_with_line(text, &assignment.span),
            (None, Some(statement)) => Ok(append_at_end(text, &statement)),
            (None, None) => Ok(text.to_string()),
        }
    }
}
