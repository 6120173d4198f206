use std::collections::BTreeMap;

use tracing::debug;

use super::{Translator, named_arguments, quote};
use crate::editor::remove_span_with_line;
use crate::error::GradleditError;
use crate::groovy::{InvocationTree, NodeId, Shape, parse};
use crate::model::{Dependency, Exclusion};
use crate::span::Span;

pub const DEPENDENCIES_PATH: &[&str] = &["dependencies"];
pub const MANAGED_DEPENDENCIES_PATH: &[&str] = &["allprojects", "dependencies"];
/// Invocation name for dependencies declared without a configuration.
pub const DIRECT_MARKER: &str = "direct";
/// Invocation name for managed dependencies under [`MANAGED_DEPENDENCIES_PATH`].
pub const MANAGED_MARKER: &str = "managed";

const EXCLUDE: &str = "exclude";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyScope {
    Project,
    Managed,
}

/// A dependency as it was found in a script, tagged by declaration shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredDependency {
    StringDeclared { dependency: Dependency, span: Span },
    MapDeclared { dependency: Dependency, span: Span },
    Direct { dependency: Dependency, span: Span },
    Managed { dependency: Dependency, span: Span },
}

impl DeclaredDependency {
    pub fn dependency(&self) -> &Dependency {
        match self {
            Self::StringDeclared { dependency, .. }
            | Self::MapDeclared { dependency, .. }
            | Self::Direct { dependency, .. }
            | Self::Managed { dependency, .. } => dependency,
        }
    }

    pub fn into_dependency(self) -> Dependency {
        match self {
            Self::StringDeclared { dependency, .. }
            | Self::MapDeclared { dependency, .. }
            | Self::Direct { dependency, .. }
            | Self::Managed { dependency, .. } => dependency,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::StringDeclared { span, .. }
            | Self::MapDeclared { span, .. }
            | Self::Direct { span, .. }
            | Self::Managed { span, .. } => *span,
        }
    }
}

/// Whether `declared` is the declaration of `requested` within `scope`.
/// Managed declarations carry no configuration, so it is not compared.
pub fn declaration_matches(
    declared: &DeclaredDependency,
    requested: &Dependency,
    scope: DependencyScope,
) -> bool {
    match (declared, scope) {
        (
            DeclaredDependency::StringDeclared { dependency, .. }
            | DeclaredDependency::MapDeclared { dependency, .. }
            | DeclaredDependency::Direct { dependency, .. },
            DependencyScope::Project,
        ) => dependency.same_declaration(requested),
        (DeclaredDependency::Managed { dependency, .. }, DependencyScope::Managed) => {
            let mut unconfigured = requested.clone();
            unconfigured.configuration = None;
            dependency.same_declaration(&unconfigured)
        }
        _ => false,
    }
}

pub(super) fn declarations(tree: &InvocationTree, scope: DependencyScope) -> Vec<DeclaredDependency> {
    let path = match scope {
        DependencyScope::Project => DEPENDENCIES_PATH,
        DependencyScope::Managed => MANAGED_DEPENDENCIES_PATH,
    };

    tree.invocations_under(path)
        .into_iter()
        .filter_map(|id| declared_dependency(tree, id, scope))
        .collect()
}

fn declared_dependency(
    tree: &InvocationTree,
    id: NodeId,
    scope: DependencyScope,
) -> Option<DeclaredDependency> {
    let node = tree.node(id);
    let configuration = match (scope, node.name.as_str()) {
        (DependencyScope::Managed, MANAGED_MARKER) => None,
        (DependencyScope::Managed, _) => return None,
        (DependencyScope::Project, DIRECT_MARKER) => None,
        (DependencyScope::Project, name) => Some(name),
    };

    let (mut dependency, map_declared) = match &node.shape {
        Shape::String { argument } => (Dependency::from_notation(argument, configuration)?, false),
        Shape::Map { entries } => (from_named_arguments(entries, configuration)?, true),
        Shape::Closure(body) => {
            let (dependency, map_declared) = match (&body.string_argument, &body.map_argument) {
                (Some(notation), _) => (Dependency::from_notation(notation, configuration)?, false),
                (None, Some(entries)) => (from_named_arguments(entries, configuration)?, true),
                (None, None) => return None,
            };
            (dependency, map_declared)
        }
    };
    dependency.exclusions = exclusions_of(tree, id);

    let span = node.span;
    Some(match (scope, configuration, map_declared) {
        (DependencyScope::Managed, _, _) => DeclaredDependency::Managed { dependency, span },
        (DependencyScope::Project, None, _) => DeclaredDependency::Direct { dependency, span },
        (DependencyScope::Project, Some(_), true) => {
            DeclaredDependency::MapDeclared { dependency, span }
        }
        (DependencyScope::Project, Some(_), false) => {
            DeclaredDependency::StringDeclared { dependency, span }
        }
    })
}

fn from_named_arguments(
    entries: &BTreeMap<String, String>,
    configuration: Option<&str>,
) -> Option<Dependency> {
    let field = |key: &str| entries.get(key).cloned();
    Some(Dependency {
        group: field("group"),
        name: field("name")?,
        version: field("version"),
        classifier: field("classifier"),
        packaging: field("ext"),
        configuration: configuration.map(str::to_string),
        exclusions: Vec::new(),
    })
}

fn exclusions_of(tree: &InvocationTree, id: NodeId) -> Vec<Exclusion> {
    tree.children(id)
        .iter()
        .filter_map(|child| {
            let node = tree.node(*child);
            match &node.shape {
                Shape::Map { entries } if node.name == EXCLUDE => Some(Exclusion {
                    group: entries.get("group").cloned(),
                    module: entries.get("module").cloned(),
                }),
                _ => None,
            }
        })
        .collect()
}

impl Translator {
    pub fn get_dependencies(&self, text: &str) -> Vec<Dependency> {
        declarations(&parse(text), DependencyScope::Project)
            .into_iter()
            .map(DeclaredDependency::into_dependency)
            .collect()
    }

    pub fn get_managed_dependencies(&self, text: &str) -> Vec<Dependency> {
        declarations(&parse(text), DependencyScope::Managed)
            .into_iter()
            .map(DeclaredDependency::into_dependency)
            .collect()
    }

    pub fn insert_dependency(
        &self,
        text: &str,
        dependency: &Dependency,
    ) -> Result<String, GradleditError> {
        let name = dependency.configuration.as_deref().unwrap_or(DIRECT_MARKER);
        let fragment = self.dependency_fragment(name, dependency);
        debug!(%dependency, "inserting dependency");
        self.editor.insert_at_path(text, &fragment, DEPENDENCIES_PATH)
    }

    pub fn insert_managed_dependency(
        &self,
        text: &str,
        dependency: &Dependency,
    ) -> Result<String, GradleditError> {
        let fragment = self.dependency_fragment(MANAGED_MARKER, dependency);
        debug!(%dependency, "inserting managed dependency");
        self.editor
            .insert_at_path(text, &fragment, MANAGED_DEPENDENCIES_PATH)
    }

    pub fn remove_dependency(
        &self,
        text: &str,
        dependency: &Dependency,
    ) -> Result<String, GradleditError> {
        self.remove_declared(text, dependency, DependencyScope::Project)
    }

    pub fn remove_managed_dependency(
        &self,
        text: &str,
        dependency: &Dependency,
    ) -> Result<String, GradleditError> {
        self.remove_declared(text, dependency, DependencyScope::Managed)
    }

    fn remove_declared(
        &self,
        text: &str,
        dependency: &Dependency,
        scope: DependencyScope,
    ) -> Result<String, GradleditError> {
        let found = declarations(&parse(text), scope)
            .into_iter()
            .find(|declared| declaration_matches(declared, dependency, scope));

        match found {
            Some(declared) => {
                debug!(%dependency, ?scope, "removing dependency");
                remove_span_with_line(text, &declared.span())
            }
            None => Err(GradleditError::unremovable(match scope {
                DependencyScope::Project => format!("dependency {dependency}"),
                DependencyScope::Managed => format!("managed dependency {dependency}"),
            })),
        }
    }

    fn dependency_fragment(&self, name: &str, dependency: &Dependency) -> String {
        let argument = if dependency.group.is_some() {
            quote(&dependency.notation())
        } else {
            named_arguments(&[
                ("name", Some(dependency.name.as_str())),
                ("version", dependency.version.as_deref()),
                ("classifier", dependency.classifier.as_deref()),
                ("ext", dependency.packaging.as_deref()),
            ])
        };

        if dependency.exclusions.is_empty() {
            return format!("{name} {argument}");
        }

        let indent = self.editor.indent_unit();
        let exclusions = dependency
            .exclusions
            .iter()
            .map(|exclusion| {
                format!(
                    "{indent}{EXCLUDE} {}",
                    named_arguments(&[
                        ("group", exclusion.group.as_deref()),
                        ("module", exclusion.module.as_deref()),
                    ])
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!("{name}({argument}) {{\n{exclusions}\n}}")
    }
}
