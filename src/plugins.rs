#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownPlugin {
    pub class_id: &'static str,
    pub short_name: &'static str,
    pub packaging: Option<&'static str>,
}

const fn plugin(
    class_id: &'static str,
    short_name: &'static str,
    packaging: Option<&'static str>,
) -> KnownPlugin {
    KnownPlugin {
        class_id,
        short_name,
        packaging,
    }
}

pub const KNOWN_PLUGINS: &[KnownPlugin] = &[
    plugin("org.gradle.api.plugins.JavaPlugin", "java", Some("jar")),
    plugin("org.gradle.api.plugins.WarPlugin", "war", Some("war")),
    plugin("org.gradle.plugins.ear.EarPlugin", "ear", Some("ear")),
    plugin("org.gradle.api.plugins.JavaPlatformPlugin", "java-platform", Some("pom")),
    plugin("org.gradle.api.plugins.JavaLibraryPlugin", "java-library", None),
    plugin("org.gradle.api.plugins.GroovyPlugin", "groovy", None),
    plugin("org.gradle.api.plugins.scala.ScalaPlugin", "scala", None),
    plugin("org.gradle.api.plugins.ApplicationPlugin", "application", None),
    plugin("org.gradle.api.plugins.BasePlugin", "base", None),
    plugin("org.gradle.api.plugins.MavenPlugin", "maven", None),
    plugin("org.gradle.api.publish.maven.plugins.MavenPublishPlugin", "maven-publish", None),
    plugin("org.gradle.plugins.ide.eclipse.EclipsePlugin", "eclipse", None),
    plugin("org.gradle.plugins.ide.idea.IdeaPlugin", "idea", None),
    plugin("org.gradle.api.plugins.quality.CheckstylePlugin", "checkstyle", None),
    plugin("org.gradle.api.plugins.quality.PmdPlugin", "pmd", None),
    plugin("org.gradle.testing.jacoco.plugins.JacocoPlugin", "jacoco", None),
    plugin("org.gradle.api.plugins.antlr.AntlrPlugin", "antlr", None),
    plugin("org.gradle.language.cpp.plugins.CppPlugin", "cpp", None),
];

pub fn by_class_id(class_id: &str) -> Option<&'static KnownPlugin> {
    KNOWN_PLUGINS.iter().find(|known| known.class_id == class_id)
}

pub fn by_short_name(short_name: &str) -> Option<&'static KnownPlugin> {
    KNOWN_PLUGINS.iter().find(|known| known.short_name == short_name)
}

/// First plugin producing `packaging`; `jar` resolves to `java`.
pub fn by_packaging(packaging: &str) -> Option<&'static KnownPlugin> {
    KNOWN_PLUGINS
        .iter()
        .find(|known| known.packaging == Some(packaging))
}

/// Looks an identifier up as either a class id or a short name.
pub fn lookup(identifier: &str) -> Option<&'static KnownPlugin> {
    by_class_id(identifier).or_else(|| by_short_name(identifier))
}

/// True when both identifiers name the same plugin, directly or through the
/// class-id / short-name table.
pub fn same_plugin(left: &str, right: &str) -> bool {
    if left == right {
        return true;
    }
    match (lookup(left), lookup(right)) {
        (Some(left_known), Some(right_known)) => left_known == right_known,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{KNOWN_PLUGINS, by_class_id, by_packaging, by_short_name, same_plugin};

    #[test]
    fn table_keys_are_unique() {
        for (index, known) in KNOWN_PLUGINS.iter().enumerate() {
            assert!(
                KNOWN_PLUGINS[index + 1..]
                    .iter()
                    .all(|other| other.class_id != known.class_id
                        && other.short_name != known.short_name),
                "duplicate entry for {}",
                known.short_name
            );
        }
    }

    #[test]
    fn lookups_work_in_every_direction() {
        assert_eq!(
            by_class_id("org.gradle.api.plugins.WarPlugin").map(|known| known.short_name),
            Some("war")
        );
        assert_eq!(
            by_short_name("java").map(|known| known.class_id),
            Some("org.gradle.api.plugins.JavaPlugin")
        );
        assert_eq!(by_packaging("jar").map(|known| known.short_name), Some("java"));
        assert_eq!(by_packaging("ear").map(|known| known.short_name), Some("ear"));
        assert!(by_packaging("zip").is_none());
    }

    #[test]
    fn aliases_and_class_ids_are_equivalent() {
        assert!(same_plugin("java", "org.gradle.api.plugins.JavaPlugin"));
        assert!(same_plugin("org.gradle.api.plugins.WarPlugin", "war"));
        assert!(same_plugin("com.example.custom", "com.example.custom"));
        assert!(!same_plugin("java", "war"));
        assert!(!same_plugin("java", "com.example.custom"));
    }
}
