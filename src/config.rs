use std::path::Path;

use serde::Deserialize;

use crate::editor::DEFAULT_INDENT_WIDTH;
use crate::error::GradleditError;

pub const DEFAULT_PROPERTY_NAMESPACE: &str = "ext";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GradleditConfig {
    /// Spaces per nesting level for synthesized blocks.
    pub indent_width: usize,
    /// Assignment prefix that marks project properties (`ext.key = value`).
    pub property_namespace: String,
}

impl Default for GradleditConfig {
    fn default() -> Self {
        Self {
            indent_width: DEFAULT_INDENT_WIDTH,
            property_namespace: DEFAULT_PROPERTY_NAMESPACE.to_string(),
        }
    }
}

impl GradleditConfig {
    pub fn from_toml_str(path: &Path, source: &str) -> Result<Self, GradleditError> {
        let config: Self = toml::from_str(source).map_err(|error| GradleditError::InvalidConfig {
            path: path.display().to_string(),
            message: error.message().to_string(),
        })?;
        config.validate(path)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, GradleditError> {
        let source =
            std::fs::read_to_string(path).map_err(|error| GradleditError::io(path, error))?;
        Self::from_toml_str(path, &source)
    }

    fn validate(&self, path: &Path) -> Result<(), GradleditError> {
        let invalid = |message: &str| GradleditError::InvalidConfig {
            path: path.display().to_string(),
            message: message.to_string(),
        };

        if self.indent_width == 0 || self.indent_width > 16 {
            return Err(invalid("indent_width must be between 1 and 16"));
        }
        let namespace_is_identifier = !self.property_namespace.is_empty()
            && self
                .property_namespace
                .split('.')
                .all(|segment| {
                    !segment.is_empty()
                        && segment
                            .chars()
                            .all(|character| character.is_alphanumeric() || character == '_')
                });
        if !namespace_is_identifier {
            return Err(invalid(
                "property_namespace must be a dotted identifier such as 'ext'",
            ));
        }
        Ok(())
    }
}
