use std::collections::BTreeMap;

use tracing::debug;

use super::{Translator, quote};
use crate::editor::{append_at_end, remove_span_with_line};
use crate::error::GradleditError;
use crate::groovy::{InvocationTree, ROOT, parse};
use crate::span::Span;

struct DeclaredProperty<'t> {
    key: &'t str,
    value: &'t str,
    span: Span,
}

impl Translator {
    /// `ns.key = value` at the root followed by `key = value` inside every
    /// root-level `ns { }` block.
    fn property_declarations<'t>(&self, tree: &'t InvocationTree) -> Vec<DeclaredProperty<'t>> {
        let prefix = format!("{}.", self.property_namespace);
        let prefixed = tree.assignments_of(ROOT).filter_map(|assignment| {
            let key = assignment.target_path.strip_prefix(&prefix)?;
            Some(DeclaredProperty {
                key,
                value: &assignment.literal_value,
                span: assignment.span,
            })
        });

        let namespace: Vec<&str> = self.property_namespace.split('.').collect();
        let blocks = tree.all_invocations_at_path(&namespace);
        let scoped = blocks
            .iter()
            .flat_map(move |block| tree.assignments_of(*block))
            .map(|assignment| DeclaredProperty {
                key: &assignment.target_path,
                value: &assignment.literal_value,
                span: assignment.span,
            });

        prefixed.chain(scoped).collect()
    }

    /// Later declarations of a key override earlier ones.
    pub(super) fn properties_of(&self, tree: &InvocationTree) -> BTreeMap<String, String> {
        self.property_declarations(tree)
            .into_iter()
            .map(|declared| (declared.key.to_string(), declared.value.to_string()))
            .collect()
    }

    pub fn get_properties(&self, text: &str) -> BTreeMap<String, String> {
        self.properties_of(&parse(text))
    }

    pub fn insert_property(
        &self,
        text: &str,
        key: &str,
        value: &str,
    ) -> Result<String, GradleditError> {
        let is_identifier = !key.is_empty()
            && !key.starts_with(|character: char| character.is_ascii_digit())
            && key
                .chars()
                .all(|character| character.is_alphanumeric() || character == '_');
        if !is_identifier {
            return Err(GradleditError::InvalidRequest {
                message: format!("Property key '{key}' is not a valid identifier"),
            });
        }
        debug!(key, "adding property");
        Ok(append_at_end(
            text,
            &format!("{}.{key} = {}", self.property_namespace, quote(value)),
        ))
    }

    /// Removes the first declaration of `key`.
    pub fn remove_property(&self, text: &str, key: &str) -> Result<String, GradleditError> {
        let tree = parse(text);
        let span = self
            .property_declarations(&tree)
            .into_iter()
            .find(|declared| declared.key == key)
            .map(|declared| declared.span)
            .ok_or_else(|| GradleditError::unremovable(format!("property '{key}'")))?;
        debug!(key, "removing property");
        remove_span_with_line(text, &span)
    }
}
