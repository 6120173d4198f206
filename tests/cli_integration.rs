use std::fs;

use serde_json::{Value, json};
use tempfile::tempdir;

mod common;

use common::{
    assert_error_type, assert_success, copy_fixture, fixture_path, path_arg, run_gradledit,
    run_gradledit_with_stdin, write_file,
};

#[test]
fn help_lists_every_subcommand() {
    let output = run_gradledit(&["--help"]);
    assert!(output.status.success());
    let help = String::from_utf8_lossy(&output.stdout);
    for command in ["read", "tree", "edit", "merge", "effective"] {
        assert!(help.contains(command), "help should mention {command}: {help}");
    }
}

#[test]
fn read_reports_the_direct_model_and_hash() {
    let fixture = fixture_path("build.gradle");
    let response = assert_success(&run_gradledit(&["read", path_arg(&fixture)]));

    let direct = &response["model"]["direct"];
    assert_eq!(direct["group"], "org.example");
    assert_eq!(direct["version"], "1.0");
    assert_eq!(direct["properties"]["servletVersion"], "3.1.0");

    let dependencies = direct["dependencies"].as_array().expect("dependencies array");
    assert!(dependencies.contains(&json!({
        "group": "com.google.guava",
        "name": "guava",
        "version": "23.0",
        "configuration": "compile"
    })));
    assert!(dependencies.contains(&json!({
        "group": "junit",
        "name": "junit",
        "version": "4.12",
        "configuration": "testCompile"
    })));

    let plugins: Vec<&str> = direct["plugins"]
        .as_array()
        .expect("plugins array")
        .iter()
        .filter_map(|plugin| plugin["id"].as_str())
        .collect();
    assert_eq!(plugins, vec!["java", "war"]);
    assert_eq!(
        direct["repositories"],
        json!([{ "url": "https://repo.example.com/releases" }])
    );

    let hash = response["source_hash"].as_str().expect("hash string");
    assert_eq!(hash.len(), 16);
    assert!(response["model"].get("effective").is_none());
}

#[test]
fn read_attaches_effective_model_and_profiles() {
    let workspace = tempdir().expect("tempdir");
    let release = write_file(&workspace, "release.gradle", "version = '1.0-release'\n");
    let script = fixture_path("build.gradle");
    let effective = fixture_path("effective.xml");
    let profile = format!("release={}", path_arg(&release));

    let response = assert_success(&run_gradledit(&[
        "read",
        "--effective",
        path_arg(&effective),
        "--profile",
        &profile,
        path_arg(&script),
    ]));

    let model = &response["model"];
    assert_eq!(model["effective"]["name"], "demo");
    assert_eq!(model["effective"]["packaging"], "war");
    assert_eq!(model["profiles"][0]["name"], "release");
    assert_eq!(model["profiles"][0]["effective"]["version"], "1.0");
    assert_eq!(model["profiles"][0]["direct"]["version"], "1.0-release");
}

#[test]
fn tree_prints_spanned_invocations() {
    let fixture = fixture_path("build.gradle");
    let response = assert_success(&run_gradledit(&["tree", path_arg(&fixture)]));
    let rendered = response["tree"].to_string();
    assert!(rendered.contains("dependencies"));
    assert!(rendered.contains("repositories"));
}

#[test]
fn edit_applies_operations_in_place() {
    let workspace = tempdir().expect("tempdir");
    let script = copy_fixture(&workspace, "build.gradle");
    let before = fs::read_to_string(&script).expect("read script");

    let request = json!({
        "operations": [
            {
                "op": "insert_dependency",
                "dependency": {
                    "group": "org.slf4j",
                    "name": "slf4j-api",
                    "version": "1.7.25",
                    "configuration": "compile"
                }
            },
            {
                "op": "remove_dependency",
                "dependency": {
                    "group": "junit",
                    "name": "junit",
                    "version": "4.12",
                    "configuration": "testCompile"
                }
            },
            { "op": "set_identity", "field": "version", "value": "2.0" }
        ]
    });
    let response = assert_success(&run_gradledit_with_stdin(
        &["edit", "--json", path_arg(&script)],
        &request.to_string(),
    ));
    assert_eq!(response["operations_applied"], 3);
    assert_eq!(response["commit"]["status"], "committed");

    let after = fs::read_to_string(&script).expect("read script");
    assert_ne!(before, after);
    assert!(after.contains("'org.slf4j:slf4j-api:1.7.25'"));
    assert!(!after.contains("name: 'junit'"));
    assert!(after.contains("version = '2.0'"));
    assert!(after.starts_with("// Demo web application\n"));
    assert!(after.contains("task copyDocs(type: Copy) {\n    from 'docs'"));

    let leftovers: Vec<_> = fs::read_dir(workspace.path())
        .expect("list workspace")
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().contains(".gradledit-tmp-"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn edit_dry_run_leaves_the_script_untouched() {
    let workspace = tempdir().expect("tempdir");
    let script = copy_fixture(&workspace, "build.gradle");
    let before = fs::read_to_string(&script).expect("read script");

    let request = json!({
        "operations": [{ "op": "insert_property", "key": "answer", "value": "42" }]
    });
    let response = assert_success(&run_gradledit_with_stdin(
        &["edit", "--json", "--dry-run", path_arg(&script)],
        &request.to_string(),
    ));

    assert_eq!(response["commit"]["status"], "dry_run");
    let preview = response["commit"]["preview"].as_str().expect("preview");
    assert!(preview.contains("ext.answer = '42'"));
    assert_eq!(fs::read_to_string(&script).expect("read script"), before);
}

#[test]
fn removing_an_absent_declaration_reports_an_error_envelope() {
    let workspace = tempdir().expect("tempdir");
    let script = copy_fixture(&workspace, "build.gradle");
    let before = fs::read_to_string(&script).expect("read script");

    let request = json!({
        "operations": [
            { "op": "insert_plugin", "id": "idea" },
            { "op": "remove_plugin", "id": "groovy" }
        ]
    });
    let output =
        run_gradledit_with_stdin(&["edit", "--json", path_arg(&script)], &request.to_string());
    let response = assert_error_type(&output, "unremovable_element");
    assert!(response["error"]["suggestion"].is_string());
    assert_eq!(fs::read_to_string(&script).expect("read script"), before);
}

#[test]
fn stale_expected_hash_is_refused() {
    let workspace = tempdir().expect("tempdir");
    let script = copy_fixture(&workspace, "build.gradle");

    let request = json!({
        "expected_hash": "0000000000000000",
        "operations": [{ "op": "remove_property", "key": "servletVersion" }]
    });
    let output =
        run_gradledit_with_stdin(&["edit", "--json", path_arg(&script)], &request.to_string());
    assert_error_type(&output, "precondition_failed");
}

#[test]
fn matching_expected_hash_is_accepted() {
    let workspace = tempdir().expect("tempdir");
    let script = copy_fixture(&workspace, "build.gradle");
    let read = assert_success(&run_gradledit(&["read", path_arg(&script)]));

    let request = json!({
        "expected_hash": read["source_hash"],
        "operations": [{ "op": "remove_property", "key": "servletVersion" }]
    });
    let response = assert_success(&run_gradledit_with_stdin(
        &["edit", "--json", path_arg(&script)],
        &request.to_string(),
    ));
    assert_eq!(response["commit"]["source_hash"], read["source_hash"]);
    let after = fs::read_to_string(&script).expect("read script");
    assert!(!after.contains("ext.servletVersion"));
}

#[test]
fn malformed_edit_request_is_an_invalid_request() {
    let fixture = fixture_path("build.gradle");
    let output = run_gradledit_with_stdin(
        &["edit", "--json", path_arg(&fixture)],
        r#"{"operations": [{"op": "rename_everything"}]}"#,
    );
    assert_error_type(&output, "invalid_request");
}

#[test]
fn merge_replays_model_changes_onto_the_script() {
    let workspace = tempdir().expect("tempdir");
    let script = copy_fixture(&workspace, "build.gradle");
    let read = assert_success(&run_gradledit(&["read", path_arg(&script)]));

    let base = read["model"]["direct"].clone();
    let mut edited = base.clone();
    edited["version"] = Value::from("1.1");
    edited["repositories"] = json!([]);
    edited["plugins"]
        .as_array_mut()
        .expect("plugins array")
        .push(json!({ "id": "idea" }));

    let base_path = write_file(&workspace, "base.json", &base.to_string());
    let model_path = write_file(&workspace, "model.json", &edited.to_string());

    let response = assert_success(&run_gradledit(&[
        "merge",
        "--model",
        path_arg(&model_path),
        "--base",
        path_arg(&base_path),
        path_arg(&script),
    ]));
    assert_eq!(response["commit"]["status"], "committed");

    let after = fs::read_to_string(&script).expect("read script");
    assert!(after.contains("version = '1.1'"));
    assert!(after.contains("apply plugin: 'idea'"));
    assert!(!after.contains("repo.example.com"));
    assert!(after.contains("mavenCentral()"));

    let reread = assert_success(&run_gradledit(&["read", path_arg(&script)]));
    assert_eq!(reread["model"]["direct"], edited);
}

#[test]
fn merge_without_changes_reports_unchanged() {
    let workspace = tempdir().expect("tempdir");
    let script = copy_fixture(&workspace, "build.gradle");
    let read = assert_success(&run_gradledit(&["read", path_arg(&script)]));
    let model_path = write_file(
        &workspace,
        "model.json",
        &read["model"]["direct"].to_string(),
    );

    let response = assert_success(&run_gradledit(&[
        "merge",
        "--model",
        path_arg(&model_path),
        path_arg(&script),
    ]));
    assert_eq!(response["commit"]["status"], "unchanged");
}

#[test]
fn effective_prints_the_parsed_dump() {
    let fixture = fixture_path("effective.xml");
    let response = assert_success(&run_gradledit(&["effective", path_arg(&fixture)]));

    let project = &response["project"];
    assert_eq!(project["group"], "org.example");
    assert_eq!(project["tasks"][0]["name"], "war");
    assert_eq!(project["tasks"][0]["depends_on"], json!(["classes"]));
    assert_eq!(project["source_sets"][0]["java_directories"], json!(["src/main/java"]));
    assert_eq!(project["properties"]["servletVersion"], "3.1.0");
    assert_eq!(response["profiles"][0]["name"], "release");
}

#[test]
fn malformed_effective_dump_is_a_parse_failure() {
    let workspace = tempdir().expect("tempdir");
    let broken = write_file(&workspace, "broken.xml", "<project><name>demo</name><");
    let output = run_gradledit(&["effective", path_arg(&broken)]);
    assert_error_type(&output, "parse_failure");
}

#[test]
fn invalid_config_from_environment_is_reported() {
    let workspace = tempdir().expect("tempdir");
    let config = write_file(&workspace, "gradledit.toml", "indent_width = 0\n");
    let fixture = fixture_path("build.gradle");

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_gradledit"))
        .env("GRADLEDIT_CONFIG", &config)
        .args(["read", path_arg(&fixture)])
        .output()
        .expect("failed to run gradledit binary");
    let response = assert_error_type(&output, "invalid_config");
    assert!(
        response["error"]["suggestion"]
            .as_str()
            .is_some_and(|suggestion| suggestion.contains("indent_width"))
    );
}

#[test]
fn configured_namespace_changes_property_inserts() {
    let workspace = tempdir().expect("tempdir");
    let script = write_file(&workspace, "build.gradle", "version = '1'\n");
    let config = write_file(
        &workspace,
        "gradledit.toml",
        "property_namespace = \"project.ext\"\n",
    );

    let request = json!({
        "operations": [{ "op": "insert_property", "key": "answer", "value": "42" }]
    });
    assert_success(&run_gradledit_with_stdin(
        &["--config", path_arg(&config), "edit", "--json", path_arg(&script)],
        &request.to_string(),
    ));
    assert_eq!(
        fs::read_to_string(&script).expect("read script"),
        "version = '1'\nproject.ext.answer = '42'\n"
    );
}

#[test]
fn version_flag_prints_the_package_version() {
    let output = run_gradledit(&["--version"]);
    assert!(output.status.success());
    let printed = String::from_utf8_lossy(&output.stdout);
    assert!(printed.contains(gradledit::version()), "version output: {printed}");
}
