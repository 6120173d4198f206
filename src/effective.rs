use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;
use tree_sitter::{Node, Parser};

use crate::error::GradleditError;
use crate::model::{Dependency, Plugin};

const PROVIDER: &str = "tree-sitter-xml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EffectiveTask {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EffectiveRepository {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceSet {
    pub name: String,
    pub java_directories: Vec<String>,
    pub resource_directories: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EffectiveProject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_project_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packaging: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_path: Option<String>,
    pub tasks: Vec<EffectiveTask>,
    pub dependencies: Vec<Dependency>,
    pub managed_dependencies: Vec<Dependency>,
    pub plugins: Vec<Plugin>,
    pub repositories: Vec<EffectiveRepository>,
    pub source_sets: Vec<SourceSet>,
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveProfile {
    pub name: String,
    pub project: EffectiveProject,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EffectiveModel {
    pub project: EffectiveProject,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<EffectiveProfile>,
}

impl EffectiveModel {
    pub fn profile(&self, name: &str) -> Option<&EffectiveProfile> {
        self.profiles.iter().find(|profile| profile.name == name)
    }
}

/// Parses the effective-model document. The root element is either
/// `project` itself or a wrapper holding one `project` and any number of
/// `profile` elements.
pub fn parse_effective_model(xml: &str) -> Result<EffectiveModel, GradleditError> {
    let root = parse_document(xml)?;

    let (project, profile_parent) = if root.name == "project" {
        (&root, &root)
    } else {
        let project = root.child("project").ok_or_else(|| GradleditError::ParseFailure {
            provider: PROVIDER,
            message: format!(
                "Effective model root <{}> has no <project> element",
                root.name
            ),
        })?;
        (project, &root)
    };

    let profiles = profile_parent
        .children_named("profile")
        .map(|profile| {
            let name = profile.child_text("name").ok_or_else(|| GradleditError::ParseFailure {
                provider: PROVIDER,
                message: "Effective model <profile> has no <name>".to_string(),
            })?;
            let project = profile.child("project").map(read_project).unwrap_or_default();
            Ok(EffectiveProfile { name, project })
        })
        .collect::<Result<Vec<_>, GradleditError>>()?;

    let model = EffectiveModel {
        project: read_project(project),
        profiles,
    };
    debug!(
        dependencies = model.project.dependencies.len(),
        profiles = model.profiles.len(),
        "read effective model"
    );
    Ok(model)
}

fn read_project(element: &XmlElement) -> EffectiveProject {
    EffectiveProject {
        group: element.child_text("group"),
        name: element.child_text("name"),
        version: element.child_text("version"),
        project_path: element.child_text("projectPath"),
        root_project_directory: element.child_text("rootProjectDirectory"),
        packaging: element.child_text("packaging"),
        archive_path: element.child_text("archivePath"),
        tasks: element
            .grandchildren("tasks", "task")
            .filter_map(|task| {
                Some(EffectiveTask {
                    name: task.child_text("name")?,
                    depends_on: task
                        .grandchildren("dependsOn", "task")
                        .filter_map(XmlElement::trimmed_text)
                        .collect(),
                })
            })
            .collect(),
        dependencies: element
            .grandchildren("dependencies", "dependency")
            .filter_map(read_dependency)
            .collect(),
        managed_dependencies: element
            .grandchildren("managedDependencies", "dependency")
            .filter_map(read_dependency)
            .collect(),
        plugins: element
            .grandchildren("plugins", "plugin")
            .filter_map(|plugin| plugin.child_text("class"))
            .map(|class_id| Plugin::new(&class_id))
            .collect(),
        repositories: element
            .grandchildren("repositories", "repository")
            .filter_map(|repository| {
                Some(EffectiveRepository {
                    name: repository.child_text("name"),
                    url: repository.child_text("url")?,
                })
            })
            .collect(),
        source_sets: element
            .grandchildren("sourceSets", "sourceSet")
            .filter_map(|source_set| {
                Some(SourceSet {
                    name: source_set.child_text("name")?,
                    java_directories: source_set
                        .grandchildren("java", "directory")
                        .filter_map(XmlElement::trimmed_text)
                        .collect(),
                    resource_directories: source_set
                        .grandchildren("resources", "directory")
                        .filter_map(XmlElement::trimmed_text)
                        .collect(),
                })
            })
            .collect(),
        properties: element
            .grandchildren("properties", "property")
            .filter_map(|property| {
                let value = property.child_text("value").unwrap_or_default();
                Some((property.child_text("key")?, value))
            })
            .collect(),
    }
}

fn read_dependency(element: &XmlElement) -> Option<Dependency> {
    Some(Dependency {
        group: element.child_text("group"),
        name: element.child_text("name")?,
        version: element.child_text("version"),
        classifier: element.child_text("classifier"),
        packaging: element.child_text("packaging"),
        configuration: element.child_text("configuration"),
        exclusions: Vec::new(),
    })
}

#[derive(Debug, Default)]
struct XmlElement {
    name: String,
    text: String,
    children: Vec<XmlElement>,
}

impl XmlElement {
    fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// `<outer><inner/>…</outer>`: every `inner` of the first `outer` child.
    fn grandchildren<'a>(
        &'a self,
        outer: &'a str,
        inner: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.child(outer)
            .into_iter()
            .flat_map(move |container| container.children_named(inner))
    }

    fn trimmed_text(&self) -> Option<String> {
        let trimmed = self.text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).and_then(XmlElement::trimmed_text)
    }
}

fn parse_document(xml: &str) -> Result<XmlElement, GradleditError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_xml::LANGUAGE_XML.into())
        .map_err(|error| GradleditError::LanguageSetup {
            message: error.to_string(),
        })?;

    let tree = parser
        .parse(xml, None)
        .ok_or_else(|| GradleditError::ParseFailure {
            provider: PROVIDER,
            message: "Tree-sitter returned no syntax tree".to_string(),
        })?;

    if tree.root_node().has_error() {
        return Err(GradleditError::ParseFailure {
            provider: PROVIDER,
            message: "Syntax errors detected in XML source".to_string(),
        });
    }

    first_element(tree.root_node())
        .map(|node| build_element(node, xml))
        .ok_or_else(|| GradleditError::ParseFailure {
            provider: PROVIDER,
            message: "XML document has no root element".to_string(),
        })
}

fn first_element(node: Node<'_>) -> Option<Node<'_>> {
    if node.kind() == "element" {
        return Some(node);
    }
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).find_map(first_element);
    found
}

fn build_element(node: Node<'_>, source: &str) -> XmlElement {
    let mut element = XmlElement::default();
    collect_content(node, source, &mut element);
    element
}

fn collect_content(node: Node<'_>, source: &str, element: &mut XmlElement) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "STag" | "EmptyElemTag" => {
                let mut tag_cursor = child.walk();
                let name = child
                    .named_children(&mut tag_cursor)
                    .find(|part| part.kind() == "Name")
                    .map(|part| node_text(part, source));
                if let Some(name) = name {
                    element.name = name.to_string();
                }
            }
            "content" => collect_content(child, source, element),
            "element" => element.children.push(build_element(child, source)),
            "CharData" => element.text.push_str(node_text(child, source)),
            "EntityRef" | "CharRef" => {
                let reference = node_text(child, source);
                match decode_reference(reference) {
                    Some(decoded) => element.text.push(decoded),
                    None => element.text.push_str(reference),
                }
            }
            "CDSect" => {
                let section = node_text(child, source);
                let data = section
                    .strip_prefix("<![CDATA[")
                    .and_then(|rest| rest.strip_suffix("]]>"))
                    .unwrap_or(section);
                element.text.push_str(data);
            }
            _ => {}
        }
    }
}

fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    &source[node.start_byte()..node.end_byte()]
}

fn decode_reference(reference: &str) -> Option<char> {
    let body = reference.strip_prefix('&')?.strip_suffix(';')?;
    match body {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let numeric = body.strip_prefix('#')?;
            let code = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EffectiveRepository, EffectiveTask, SourceSet, decode_reference, parse_effective_model};
    use crate::error::GradleditError;
    use crate::model::{Dependency, Plugin};

    const DUMP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<model>
  <project>
    <group>org.example</group>
    <name>demo</name>
    <version>1.0</version>
    <projectPath>:</projectPath>
    <rootProjectDirectory>/work/demo</rootProjectDirectory>
    <packaging>war</packaging>
    <archivePath>/work/demo/build/libs/demo-1.0.war</archivePath>
    <tasks>
      <task>
        <name>build</name>
        <dependsOn><task>assemble</task><task>check</task></dependsOn>
      </task>
      <task><name>clean</name></task>
    </tasks>
    <dependencies>
      <dependency>
        <group>junit</group>
        <name>junit</name>
        <version>4.12</version>
        <configuration>testCompile</configuration>
      </dependency>
      <dependency><group>broken</group></dependency>
    </dependencies>
    <managedDependencies>
      <dependency><group>org.slf4j</group><name>slf4j-api</name><version>1.7.25</version></dependency>
    </managedDependencies>
    <plugins>
      <plugin><class>org.gradle.api.plugins.WarPlugin</class></plugin>
    </plugins>
    <repositories>
      <repository><name>internal</name><url>https://repo.example.com/?a=1&amp;b=2</url></repository>
    </repositories>
    <sourceSets>
      <sourceSet>
        <name>main</name>
        <java><directory>src/main/java</directory></java>
        <resources><directory>src/main/resources</directory><directory>conf</directory></resources>
      </sourceSet>
    </sourceSets>
    <properties>
      <property><key>note</key><value><![CDATA[a <b> c]]></value></property>
      <property><key>empty</key><value/></property>
    </properties>
  </project>
  <profile>
    <name>release</name>
    <project><version>1.0-release</version></project>
  </profile>
</model>
"#;

    #[test]
    fn wrapper_document_maps_every_section() {
        let model = parse_effective_model(DUMP).expect("dump should parse");
        let project = &model.project;

        assert_eq!(project.group.as_deref(), Some("org.example"));
        assert_eq!(project.name.as_deref(), Some("demo"));
        assert_eq!(project.project_path.as_deref(), Some(":"));
        assert_eq!(project.packaging.as_deref(), Some("war"));
        assert_eq!(
            project.tasks,
            vec![
                EffectiveTask {
                    name: "build".to_string(),
                    depends_on: vec!["assemble".to_string(), "check".to_string()],
                },
                EffectiveTask {
                    name: "clean".to_string(),
                    depends_on: Vec::new(),
                },
            ]
        );
        assert_eq!(
            project.dependencies,
            vec![Dependency::new("junit", "junit", Some("4.12")).with_configuration("testCompile")]
        );
        assert_eq!(
            project.managed_dependencies,
            vec![Dependency::new("org.slf4j", "slf4j-api", Some("1.7.25"))]
        );
        assert_eq!(
            project.plugins,
            vec![Plugin::new("org.gradle.api.plugins.WarPlugin")]
        );
        assert_eq!(
            project.repositories,
            vec![EffectiveRepository {
                name: Some("internal".to_string()),
                url: "https://repo.example.com/?a=1&b=2".to_string(),
            }]
        );
        assert_eq!(
            project.source_sets,
            vec![SourceSet {
                name: "main".to_string(),
                java_directories: vec!["src/main/java".to_string()],
                resource_directories: vec![
                    "src/main/resources".to_string(),
                    "conf".to_string()
                ],
            }]
        );
        assert_eq!(project.properties.get("note").map(String::as_str), Some("a <b> c"));
        assert_eq!(project.properties.get("empty").map(String::as_str), Some(""));

        let release = model.profile("release").expect("release profile");
        assert_eq!(release.project.version.as_deref(), Some("1.0-release"));
        assert!(release.project.dependencies.is_empty());
    }

    #[test]
    fn bare_project_root_is_accepted() {
        let model = parse_effective_model("<project><name>solo</name></project>")
            .expect("bare project should parse");
        assert_eq!(model.project.name.as_deref(), Some("solo"));
        assert!(model.profiles.is_empty());
    }

    #[test]
    fn malformed_or_projectless_documents_fail() {
        let malformed = parse_effective_model("<project><name>x</project>");
        assert!(matches!(
            malformed,
            Err(GradleditError::ParseFailure { provider: "tree-sitter-xml", .. })
        ));

        let projectless = parse_effective_model("<model><profile><name>a</name></profile></model>");
        assert!(matches!(
            projectless,
            Err(GradleditError::ParseFailure { message, .. }) if message.contains("<project>")
        ));
    }

    #[test]
    fn references_decode_to_characters() {
        assert_eq!(decode_reference("&lt;"), Some('<'));
        assert_eq!(decode_reference("&#65;"), Some('A'));
        assert_eq!(decode_reference("&#x263A;"), Some('\u{263A}'));
        assert_eq!(decode_reference("&unknown;"), None);
    }
}
