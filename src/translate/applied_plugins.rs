use tracing::debug;

use super::{Translator, quote};
use crate::editor::{append_at_end, remove_span_with_line};
use crate::error::GradleditError;
use crate::groovy::{InvocationTree, ROOT, Shape, parse};
use crate::model::Plugin;
use crate::span::Span;

const APPLY: &str = "apply";
const PLUGIN_KEY: &str = "plugin";
const PLUGINS_BLOCK: &[&str] = &["plugins"];
const PLUGIN_ID: &str = "id";

pub(super) struct DeclaredPlugin {
    pub plugin: Plugin,
    pub span: Span,
}

/// `apply plugin: 'x'` at the root, then `id 'x'` inside every root
/// `plugins { }` block, in document order per form.
pub(super) fn declarations(tree: &InvocationTree) -> Vec<DeclaredPlugin> {
    let applied = tree.children(ROOT).iter().filter_map(|id| {
        let node = tree.node(*id);
        match &node.shape {
            Shape::Map { entries } if node.name == APPLY => {
                entries.get(PLUGIN_KEY).map(|identifier| DeclaredPlugin {
                    plugin: Plugin::new(identifier),
                    span: node.span,
                })
            }
            _ => None,
        }
    });

    let requested = tree
        .invocations_under(PLUGINS_BLOCK)
        .into_iter()
        .filter_map(|id| {
            let node = tree.node(id);
            match &node.shape {
                Shape::String { argument } if node.name == PLUGIN_ID => Some(DeclaredPlugin {
                    plugin: Plugin::new(argument),
                    span: node.span,
                }),
                _ => None,
            }
        });

    applied.chain(requested).collect()
}

impl Translator {
    pub fn get_plugins(&self, text: &str) -> Vec<Plugin> {
        declarations(&parse(text))
            .into_iter()
            .map(|declared| declared.plugin)
            .collect()
    }

    /// Appends `apply plugin: '<short id>'` at the end of the script.
    pub fn insert_plugin(&self, text: &str, plugin: &Plugin) -> Result<String, GradleditError> {
        if plugin.id.trim().is_empty() {
            return Err(GradleditError::InvalidRequest {
                message: "Plugin identifier must not be empty".to_string(),
            });
        }
        debug!(plugin = %plugin.id, "applying plugin");
        Ok(append_at_end(
            text,
            &format!("{APPLY} {PLUGIN_KEY}: {}", quote(plugin.short_id())),
        ))
    }

    pub fn remove_plugin(&self, text: &str, plugin: &Plugin) -> Result<String, GradleditError> {
        let found = declarations(&parse(text))
            .into_iter()
            .find(|declared| declared.plugin.matches(plugin))
            .ok_or_else(|| GradleditError::unremovable(format!("plugin '{}'", plugin.id)))?;
        debug!(plugin = %plugin.id, "removing plugin");
        remove_span_with_line(text, &found.span)
    }
}
