use tracing::{debug, warn};

use crate::error::GradleditError;
use crate::model::{Dependency, GradleModel, IdentityField, Plugin};
use crate::plugins;
use crate::translate::Translator;

/// Items of `left` with no counterpart in `right` under `same`.
fn difference<'a, T>(left: &'a [T], right: &[T], same: impl Fn(&T, &T) -> bool) -> Vec<&'a T> {
    left.iter()
        .filter(|item| !right.iter().any(|other| same(*item, other)))
        .collect()
}

/// Rewrites `text` so that the facts that changed from `old` to `new` are
/// reflected in the script.
///
/// Steps run in dependency order: identity first, then plugins (which other
/// declarations may rely on), repositories before the dependencies resolved
/// from them, tasks once their plugins are applied, properties last.
pub fn merge(
    translator: &Translator,
    text: &str,
    old: &GradleModel,
    new: &GradleModel,
) -> Result<String, GradleditError> {
    let mut updated = text.to_string();

    for field in IdentityField::ALL {
        let requested = new.identity(field);
        if translator.get_identity(&updated, field).as_deref() != requested {
            updated = translator.set_identity(&updated, field, requested)?;
        }
    }

    for plugin in difference(&old.plugins, &new.plugins, Plugin::matches) {
        updated = translator.remove_plugin(&updated, plugin)?;
    }
    for plugin in difference(&new.plugins, &old.plugins, Plugin::matches) {
        updated = translator.insert_plugin(&updated, plugin)?;
    }
    if old.packaging() != new.packaging()
        && let Some(known) = new.packaging().and_then(plugins::by_packaging)
    {
        let plugin = Plugin::new(known.class_id);
        let applied = translator
            .get_plugins(&updated)
            .iter()
            .any(|existing| existing.matches(&plugin));
        if !applied {
            debug!(plugin = known.short_name, "applying plugin for new packaging");
            updated = translator.insert_plugin(&updated, &plugin)?;
        }
    }

    for repository in difference(&old.repositories, &new.repositories, |left, right| left == right) {
        updated = translator.remove_repository(&updated, repository)?;
    }
    for repository in difference(&new.repositories, &old.repositories, |left, right| left == right) {
        updated = translator.insert_repository(&updated, repository)?;
    }

    let same_dependency = |left: &Dependency, right: &Dependency| left.same_declaration(right);
    for dependency in difference(&old.dependencies, &new.dependencies, same_dependency) {
        updated = translator.remove_dependency(&updated, dependency)?;
    }
    for dependency in difference(&new.dependencies, &old.dependencies, same_dependency) {
        updated = translator.insert_dependency(&updated, dependency)?;
    }
    for dependency in difference(
        &old.managed_dependencies,
        &new.managed_dependencies,
        same_dependency,
    ) {
        updated = translator.remove_managed_dependency(&updated, dependency)?;
    }
    for dependency in difference(
        &new.managed_dependencies,
        &old.managed_dependencies,
        same_dependency,
    ) {
        updated = translator.insert_managed_dependency(&updated, dependency)?;
    }

    for task in difference(&new.tasks, &old.tasks, |left, right| left == right) {
        updated = translator.insert_task(&updated, task)?;
    }
    for task in difference(&old.tasks, &new.tasks, |left, right| left == right) {
        warn!(task = %task.name, "task removal is not supported; declaration left in place");
    }

    for (key, value) in &old.properties {
        if new.properties.get(key) != Some(value) {
            updated = translator.remove_property(&updated, key)?;
        }
    }
    for (key, value) in &new.properties {
        if old.properties.get(key) != Some(value) {
            updated = translator.insert_property(&updated, key, value)?;
        }
    }

    debug!(
        changed = updated != text,
        "merged model changes into script"
    );
    Ok(updated)
}
