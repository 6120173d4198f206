use std::collections::BTreeMap;

use super::{INTERPOLATION_PLACEHOLDER, MAX_NESTING_DEPTH, ROOT, Shape, parse};
use crate::span::{Position, Span};

fn entries(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[test]
fn string_map_and_closure_calls_are_recognised() {
    let tree = parse(
        "apply plugin: 'java'\n\
         dependencies {\n    compile 'a:b:1.0'\n    testCompile('x:y:2.0')\n}\n",
    );

    let root_children = tree.children(ROOT);
    assert_eq!(root_children.len(), 2);

    let apply = tree.node(root_children[0]);
    assert_eq!(apply.name, "apply");
    assert_eq!(
        apply.shape,
        Shape::Map {
            entries: entries(&[("plugin", "java")])
        }
    );
    assert_eq!(
        apply.span,
        Span::new(Position::new(1, 1), Position::new(1, 21))
    );

    let dependencies = root_children[1];
    assert_eq!(tree.node(dependencies).name, "dependencies");
    assert_eq!(
        tree.node(dependencies).span,
        Span::new(Position::new(2, 1), Position::new(5, 2))
    );
    let declared: Vec<_> = tree
        .children(dependencies)
        .iter()
        .map(|child| {
            let node = tree.node(*child);
            match &node.shape {
                Shape::String { argument } => (node.name.clone(), argument.clone()),
                other => panic!("expected string call, got {other:?}"),
            }
        })
        .collect();
    assert_eq!(
        declared,
        vec![
            ("compile".to_string(), "a:b:1.0".to_string()),
            ("testCompile".to_string(), "x:y:2.0".to_string()),
        ]
    );
}

#[test]
fn map_calls_keep_only_literal_entries() {
    let tree = parse("compile group: 'g', name: computeName(), version: \"$v\", ext: 'zip'\n");
    let call = tree.node(tree.children(ROOT)[0]);
    assert_eq!(
        call.shape,
        Shape::Map {
            entries: entries(&[("group", "g"), ("ext", "zip")])
        }
    );
}

#[test]
fn closure_call_keeps_first_class_string_and_map_arguments() {
    let tree = parse(
        "dependencies {\n    compile('g:n:1') {\n        exclude module: 'm'\n    }\n    runtime(group: 'g', name: 'r') {\n    }\n}\n",
    );
    let dependencies = tree.child_named(ROOT, "dependencies").expect("dependencies block");
    let children = tree.children(dependencies);
    assert_eq!(children.len(), 2);

    let with_string = tree.closure_body(children[0]).expect("closure body");
    assert_eq!(with_string.string_argument.as_deref(), Some("g:n:1"));
    assert_eq!(with_string.children.len(), 1);
    let exclude = tree.node(with_string.children[0]);
    assert_eq!(exclude.name, "exclude");

    let with_map = tree.closure_body(children[1]).expect("closure body");
    assert_eq!(
        with_map.map_argument,
        Some(entries(&[("group", "g"), ("name", "r")]))
    );
}

#[test]
fn assignments_record_dotted_paths_and_literal_values() {
    let tree = parse(
        "version = '4.0'\next.answer = 42\nthis.getFoo().bar = \"x-${suffix}\"\ndef local = 'skip'\ncount = compute()\n",
    );
    let recorded: Vec<_> = tree
        .assignments_of(ROOT)
        .map(|assignment| {
            (
                assignment.target_path.clone(),
                assignment.literal_value.clone(),
            )
        })
        .collect();
    assert_eq!(
        recorded,
        vec![
            ("version".to_string(), "4.0".to_string()),
            ("ext.answer".to_string(), "42".to_string()),
            (
                "this.getFoo().bar".to_string(),
                format!("x-{INTERPOLATION_PLACEHOLDER}")
            ),
        ]
    );
    let version = tree.assignment_at(ROOT, "version").expect("version assignment");
    assert_eq!(
        version.span,
        Span::new(Position::new(1, 1), Position::new(1, 16))
    );
}

#[test]
fn unrecognised_statements_are_invisible() {
    let tree = parse(
        "task hello(type: Copy) {\n    from 'src'\n}\nif (x) {\n    compile 'a:b:c'\n}\nsubprojects.each { p ->\n    apply plugin: 'java'\n}\ncompile 'a', 'b'\nid 'x' version '1'\nmavenCentral()\n",
    );
    assert!(tree.is_empty(), "no construct should be modelled: {tree:?}");
}

#[test]
fn script_without_recognised_constructs_yields_empty_tree() {
    let tree = parse("// just a comment\n\n/* and a block */\nprintln 1 + 2\n");
    assert!(tree.is_empty());
    assert!(tree.all_invocations_at_path(&["dependencies"]).is_empty());
}

#[test]
fn skipped_statements_do_not_swallow_following_lines() {
    let tree = parse("def x = [\n  'a',\n  'b'\n]\nversion = '1'\nfoo.bar()\n    .baz()\ngroup = 'g'\n");
    let paths: Vec<_> = tree
        .assignments_of(ROOT)
        .map(|assignment| assignment.target_path.as_str())
        .collect();
    assert_eq!(paths, vec!["version", "group"]);
}

#[test]
fn path_lookup_collects_duplicated_blocks_anchored_at_root() {
    let tree = parse(
        "repositories {\n    maven { url 'https://one' }\n}\nrepositories {\n    maven {\n        url 'https://two'\n    }\n}\nsubprojects {\n    repositories {\n        maven { url 'https://nested' }\n    }\n}\n",
    );
    let mavens = tree.all_invocations_at_path(&["repositories", "maven"]);
    assert_eq!(mavens.len(), 2);
    let urls: Vec<_> = mavens
        .iter()
        .flat_map(|maven| tree.children(*maven).iter())
        .map(|url| match &tree.node(*url).shape {
            Shape::String { argument } => argument.clone(),
            other => panic!("expected string url, got {other:?}"),
        })
        .collect();
    assert_eq!(urls, vec!["https://one", "https://two"]);
    assert_eq!(tree.all_invocations_at_path(&[]), vec![ROOT]);
    assert!(tree.all_invocations_at_path(&["repositories", "ivy"]).is_empty());
}

#[test]
fn first_match_wins_for_repeated_names() {
    let tree = parse("ext {\n    a = '1'\n}\next {\n    a = '2'\n}\n");
    let first = tree.child_named(ROOT, "ext").expect("ext block");
    assert_eq!(
        tree.assignment_at(first, "a")
            .map(|assignment| assignment.literal_value.as_str()),
        Some("1")
    );
}

#[test]
fn closure_braces_are_recorded_for_splicing() {
    let tree = parse("repositories {}\nallprojects {\n  dependencies {\n  }\n}\n");
    let repositories = tree.closure_body(tree.children(ROOT)[0]).expect("closure");
    let braces = repositories.braces.expect("braces");
    assert_eq!(braces.open, Position::new(1, 14));
    assert_eq!(braces.close, Some(Position::new(1, 15)));

    let nested = tree.all_invocations_at_path(&["allprojects", "dependencies"]);
    assert_eq!(nested.len(), 1);
    let nested_braces = tree
        .closure_body(nested[0])
        .and_then(|body| body.braces)
        .expect("nested braces");
    assert_eq!(nested_braces.close, Some(Position::new(4, 3)));
}

#[test]
fn unterminated_closure_keeps_children_and_has_no_closing_brace() {
    let tree = parse("dependencies {\n    compile 'a:b:1'\n");
    let dependencies = tree.child_named(ROOT, "dependencies").expect("dependencies");
    assert_eq!(tree.children(dependencies).len(), 1);
    let braces = tree
        .closure_body(dependencies)
        .and_then(|body| body.braces)
        .expect("braces");
    assert_eq!(braces.close, None);
}

#[test]
fn closure_followed_by_chained_call_is_not_modelled() {
    let tree = parse("configurations {\n    compile\n}.each { println it }\nversion = '2'\n");
    assert!(tree.child_named(ROOT, "configurations").is_none());
    assert!(tree.assignment_at(ROOT, "version").is_some());
}

#[test]
fn semicolons_separate_statements_on_one_line() {
    let tree = parse("group = 'g'; version = '1'\n");
    assert_eq!(tree.assignments_of(ROOT).count(), 2);
}

#[test]
fn closures_nested_past_the_depth_limit_are_skipped() {
    let tree = parse(&"a {\n".repeat(5_000));
    assert_eq!(tree.len(), MAX_NESTING_DEPTH + 1);

    let levels = 1_000;
    let text = format!(
        "{}{}version = '1'\n",
        "a {\n".repeat(levels),
        "}\n".repeat(levels)
    );
    let tree = parse(&text);
    assert_eq!(tree.len(), MAX_NESTING_DEPTH + 1);
    assert_eq!(tree.children(ROOT).len(), 1);
    assert_eq!(
        tree.assignment_at(ROOT, "version")
            .map(|assignment| assignment.literal_value.as_str()),
        Some("1")
    );
}
