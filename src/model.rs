use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::effective::EffectiveProject;
use crate::plugins;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Exclusion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dependency {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packaging: Option<String>,
    /// `None` marks a direct dependency declared without a configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclusions: Vec<Exclusion>,
}

fn coordinate_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(?P<group>[^:@]*):(?P<name>[^:@]+)(?::(?P<version>[^:@]*))?(?::(?P<classifier>[^:@]*))?(?:@(?P<packaging>[^:@]+))?$",
        )
        .expect("coordinate pattern should compile")
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

impl Dependency {
    pub fn new(group: &str, name: &str, version: Option<&str>) -> Self {
        Self {
            group: non_empty(Some(group)),
            name: name.to_string(),
            version: non_empty(version),
            ..Self::default()
        }
    }

    pub fn with_configuration(mut self, configuration: &str) -> Self {
        self.configuration = Some(configuration.to_string());
        self
    }

    /// Parses Gradle's `group:name[:version[:classifier]][@packaging]` notation.
    pub fn from_notation(notation: &str, configuration: Option<&str>) -> Option<Self> {
        let captures = coordinate_pattern().captures(notation.trim())?;
        let field = |key: &str| non_empty(captures.name(key).map(|found| found.as_str()));

        Some(Self {
            group: field("group"),
            name: field("name")?,
            version: field("version"),
            classifier: field("classifier"),
            packaging: field("packaging"),
            configuration: configuration.map(str::to_string),
            exclusions: Vec::new(),
        })
    }

    pub fn notation(&self) -> String {
        let mut notation = format!(
            "{}:{}",
            self.group.as_deref().unwrap_or_default(),
            self.name
        );
        if self.version.is_some() || self.classifier.is_some() {
            notation.push(':');
            notation.push_str(self.version.as_deref().unwrap_or_default());
        }
        if let Some(classifier) = &self.classifier {
            notation.push(':');
            notation.push_str(classifier);
        }
        if let Some(packaging) = &self.packaging {
            notation.push('@');
            notation.push_str(packaging);
        }
        notation
    }

    /// Exclusions with an omitted group defaulted to this dependency's group.
    pub fn normalized_exclusions(&self) -> Vec<Exclusion> {
        self.exclusions
            .iter()
            .map(|exclusion| Exclusion {
                group: exclusion.group.clone().or_else(|| self.group.clone()),
                module: exclusion.module.clone(),
            })
            .collect()
    }

    /// Equality on coordinates and configuration, with exclusions compared
    /// after group defaulting.
    pub fn same_declaration(&self, other: &Dependency) -> bool {
        self.group == other.group
            && self.name == other.name
            && self.version == other.version
            && self.classifier == other.classifier
            && self.packaging == other.packaging
            && self.configuration == other.configuration
            && self.normalized_exclusions() == other.normalized_exclusions()
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.configuration {
            Some(configuration) => write!(formatter, "{configuration} '{}'", self.notation()),
            None => write!(formatter, "'{}'", self.notation()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plugin {
    pub id: String,
}

impl Plugin {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }

    pub fn matches(&self, other: &Plugin) -> bool {
        plugins::same_plugin(&self.id, &other.id)
    }

    pub fn short_id(&self) -> &str {
        plugins::lookup(&self.id).map_or(self.id.as_str(), |known| known.short_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Repository {
    pub url: String,
}

impl Repository {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Task {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityField {
    Group,
    Version,
    ArchiveName,
}

impl IdentityField {
    pub const ALL: [IdentityField; 3] = [Self::Group, Self::Version, Self::ArchiveName];

    pub fn target_path(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Version => "version",
            Self::ArchiveName => "archivesBaseName",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GradleModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_name: Option<String>,
    /// Requested archive packaging. Scripts never state it directly, so a
    /// model read from text leaves it empty and falls back to the plugins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packaging: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub managed_dependencies: Vec<Dependency>,
    #[serde(default)]
    pub plugins: Vec<Plugin>,
    #[serde(default)]
    pub repositories: Vec<Repository>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

const PACKAGING_PRIORITY: [&str; 4] = ["ear", "war", "pom", "jar"];

impl GradleModel {
    pub fn identity(&self, field: IdentityField) -> Option<&str> {
        match field {
            IdentityField::Group => self.group.as_deref(),
            IdentityField::Version => self.version.as_deref(),
            IdentityField::ArchiveName => self.archive_name.as_deref(),
        }
    }

    pub fn set_identity(&mut self, field: IdentityField, value: Option<String>) {
        match field {
            IdentityField::Group => self.group = value,
            IdentityField::Version => self.version = value,
            IdentityField::ArchiveName => self.archive_name = value,
        }
    }

    /// Explicit packaging, else the one implied by the applied plugins.
    pub fn packaging(&self) -> Option<&str> {
        self.packaging.as_deref().or_else(|| self.implied_packaging())
    }

    pub fn implied_packaging(&self) -> Option<&'static str> {
        let produced: Vec<&'static str> = self
            .plugins
            .iter()
            .filter_map(|plugin| plugins::lookup(&plugin.id))
            .filter_map(|known| known.packaging)
            .collect();
        PACKAGING_PRIORITY
            .into_iter()
            .find(|packaging| produced.contains(packaging))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileModel {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direct: Option<GradleModel>,
    pub effective: EffectiveProject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectModel {
    pub direct: GradleModel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective: Option<EffectiveProject>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<ProfileModel>,
}

impl ProjectModel {
    pub fn new(direct: GradleModel) -> Self {
        Self {
            direct,
            effective: None,
            profiles: Vec::new(),
        }
    }

    pub fn packaging(&self) -> Option<&str> {
        self.effective
            .as_ref()
            .and_then(|effective| effective.packaging.as_deref())
            .or_else(|| self.direct.packaging())
    }

    pub fn profile(&self, name: &str) -> Option<&ProfileModel> {
        self.profiles.iter().find(|profile| profile.name == name)
    }
}
