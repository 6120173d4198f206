use crate::config::GradleditConfig;
use crate::editor::TextEditor;
use crate::groovy::parse;
use crate::model::{GradleModel, IdentityField};

mod applied_plugins;
mod dependencies;
mod identity;
mod properties;
mod repositories;
mod tasks;


pub use dependencies::{
    DIRECT_MARKER, DEPENDENCIES_PATH, DeclaredDependency, DependencyScope, MANAGED_DEPENDENCIES_PATH,
    MANAGED_MARKER, declaration_matches,
};
pub use repositories::REPOSITORIES_PATH;

#[derive(Debug, Clone)]
pub struct Translator {
    editor: TextEditor,
    property_namespace: String,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(&GradleditConfig::default())
    }
}

impl Translator {
    pub fn new(config: &GradleditConfig) -> Self {
        Self {
            editor: TextEditor::new(config.indent_width),
            property_namespace: config.property_namespace.clone(),
        }
    }

    pub fn editor(&self) -> &TextEditor {
        &self.editor
    }

    /// Direct model of a script, computed from a single parse.
    pub fn read_model(&self, text: &str) -> GradleModel {
        let tree = parse(text);
        let mut model = GradleModel {
            dependencies: dependencies::declarations(&tree, DependencyScope::Project)
                .into_iter()
                .map(DeclaredDependency::into_dependency)
                .collect(),
            managed_dependencies: dependencies::declarations(&tree, DependencyScope::Managed)
                .into_iter()
                .map(DeclaredDependency::into_dependency)
                .collect(),
            plugins: applied_plugins::declarations(&tree)
                .into_iter()
                .map(|declared| declared.plugin)
                .collect(),
            repositories: repositories::declarations(&tree)
                .into_iter()
                .map(|declared| declared.repository)
                .collect(),
            properties: self.properties_of(&tree),
            ..GradleModel::default()
        };
        for field in IdentityField::ALL {
            model.set_identity(field, identity::value_of(&tree, field));
        }
        model
    }
}

/// Renders `value` as a single-quoted Groovy string literal.
pub(crate) fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for character in value.chars() {
        match character {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            other => quoted.push(other),
        }
    }
    quoted.push('\'');
    quoted
}

/// `key: 'value', ...` for the present entries, in the given order.
pub(crate) fn named_arguments(entries: &[(&str, Option<&str>)]) -> String {
    entries
        .iter()
        .filter_map(|(key, value)| value.map(|value| format!("{key}: {}", quote(value))))
        .collect::<Vec<_>>()
        .join(", ")
}
