use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use uiforge_dsl::{
    ingest, parse_document, validate, validate_with, ButtonVariant, IngestError, IngestPolicy,
    InputKind, IssueKind, Node, Origin, TextVariant, ValidateOptions,
};

fn get_fixture(filename: &str) -> Value {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("fixtures");
    path.push(filename);
    let text = fs::read_to_string(&path).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn shape(node: &Node) -> Value {
    let children: Vec<Value> = node.children().iter().map(shape).collect();
    if children.is_empty() {
        return json!(node.type_name());
    }
    let mut map = serde_json::Map::new();
    map.insert(node.type_name().to_string(), Value::Array(children));
    Value::Object(map)
}

// Fixtures

#[test]
fn test_valid_login_fixture() {
    let doc = validate(&get_fixture("valid-login.json")).unwrap();
    let ids: Vec<&str> = doc.nodes().iter().map(|n| n.id()).collect();
    assert_eq!(ids, vec!["root", "title", "login", "email", "pass", "submit"]);

    match doc.find("submit") {
        Some(Node::Button(b)) => {
            assert_eq!(b.debounce_ms, 800);
            assert_eq!(b.variant, ButtonVariant::Primary);
        }
        other => panic!("expected button, got {:?}", other),
    }
    assert!(doc.palette.as_ref().unwrap().text_contrast().unwrap().passes_aa());
}

#[test]
fn test_image_representation_fixture_converts() {
    let ingested = ingest(&get_fixture("image-representation.json"), &IngestPolicy::default()).unwrap();
    assert_eq!(ingested.origin, Origin::Converted { strategy: "keyword-login" });
    assert_eq!(
        shape(&ingested.document.root),
        json!({"container": ["image", "text", {"form": ["input", "input"]}]})
    );
    match ingested.document.find("img") {
        Some(Node::Image(img)) => assert_eq!(img.src, "https://assets.example.test/mock/signin.png"),
        other => panic!("expected image, got {:?}", other),
    }
}

#[test]
fn test_version_mismatch_fixture() {
    let raw = get_fixture("version-mismatch.json");
    let errors = validate(&raw).unwrap_err();
    assert_eq!(errors.issues()[0].kind, IssueKind::VersionMismatch);
    assert_eq!(errors.to_string(), "version: Invalid literal value, expected \"0.1\"");

    // "Login" would otherwise satisfy the keyword heuristic
    let err = ingest(&raw, &IngestPolicy::default()).unwrap_err();
    assert!(matches!(err, IngestError::Schema(_)));
}

#[test]
fn test_unknown_type_fixture_reports_all_issues() {
    let errors = validate(&get_fixture("invalid-unknown-type.json")).unwrap_err();
    let kinds: Vec<IssueKind> = errors.issues().iter().map(|i| i.kind).collect();
    assert_eq!(kinds, vec![IssueKind::UnknownType, IssueKind::Missing]);
    assert_eq!(
        errors.messages()[1],
        "root.children.1.content: Required".to_string()
    );
}

// Defaults

#[test]
fn test_bare_button_gets_defaults() {
    let doc = validate(&json!({"version": "0.1", "root": {"type": "button", "text": "Go"}})).unwrap();
    let wire = doc.to_json();
    assert_eq!(wire["root"]["variant"], "primary");
    assert_eq!(wire["root"]["debounceMs"], 600);
    assert!(wire["root"]["id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[test]
fn test_text_example_document() {
    let doc = parse_document(r#"{"version":"0.1","root":{"type":"text","content":"Hi"}}"#).unwrap();
    match &doc.root {
        Node::Text(t) => {
            assert!(!t.id.is_empty());
            assert_eq!(t.content, "Hi");
            assert_eq!(t.variant, TextVariant::P);
        }
        other => panic!("expected text, got {:?}", other),
    }
}

#[test]
fn test_defaults_fill_recursively() {
    let raw = json!({
        "version": "0.1",
        "root": {"type": "card", "children": [
            {"type": "container", "children": [{"type": "input"}, {"type": "image", "src": "a.png"}]}
        ]}
    });
    let wire = validate(&raw).unwrap().to_json();
    assert_eq!(wire["root"]["padding"], 16.0);
    let container = &wire["root"]["children"][0];
    assert_eq!(container["direction"], "vertical");
    assert_eq!(container["gap"], 12.0);
    assert_eq!(container["children"][0]["name"], "field");
    assert_eq!(container["children"][0]["kind"], "text");
    assert_eq!(container["children"][0]["showToggle"], true);
    assert_eq!(container["children"][1]["alt"], "");
    assert_eq!(container["children"][1]["radius"], 8.0);
}

#[test]
fn test_children_keep_source_order() {
    let raw = json!({
        "version": "0.1",
        "root": {"type": "form", "children": [
            {"type": "text", "id": "c", "content": "3"},
            {"type": "text", "id": "a", "content": "1"},
            {"type": "text", "id": "b", "content": "2"}
        ]}
    });
    let doc = validate(&raw).unwrap();
    let ids: Vec<&str> = doc.root.children().iter().map(|n| n.id()).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
}

#[test]
fn test_unknown_extra_fields_dropped() {
    let raw = json!({
        "version": "0.1",
        "theme": "dark",
        "root": {"type": "text", "id": "t", "content": "x", "color": "red"}
    });
    let wire = validate(&raw).unwrap().to_json();
    assert!(wire.get("theme").is_none());
    assert!(wire["root"].get("color").is_none());
}

#[test]
fn test_password_toggle_default_and_opt_out() {
    let raw = json!({
        "version": "0.1",
        "root": {"type": "form", "children": [
            {"type": "input", "id": "a", "kind": "password"},
            {"type": "input", "id": "b", "kind": "password", "showToggle": false},
            {"type": "input", "id": "c", "kind": "email"}
        ]}
    });
    let doc = validate(&raw).unwrap();
    let reveal: Vec<bool> = doc
        .root
        .children()
        .iter()
        .map(|n| match n {
            Node::Input(i) => i.has_reveal_control(),
            _ => false,
        })
        .collect();
    assert_eq!(reveal, vec![true, false, false]);
}

#[test]
fn test_structural_ids_repeatable() {
    let raw = json!({"version": "0.1", "root": {"type": "form", "children": [{"type": "input"}]}});
    let options = ValidateOptions::structural_ids();
    let first = validate_with(&raw, &options).unwrap();
    let second = validate_with(&raw, &options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_canonical_output_revalidates_unchanged() {
    let doc = validate(&get_fixture("valid-login.json")).unwrap();
    let again = validate(&doc.to_json()).unwrap();
    assert_eq!(doc, again);
}

// Heuristic fallback

#[test]
fn test_email_and_senha_convert_without_button() {
    let raw = json!({"fields": ["email", "senha"]});
    let ingested = ingest(&raw, &IngestPolicy::default()).unwrap();
    assert_eq!(
        shape(&ingested.document.root),
        json!({"container": ["text", {"form": ["input", "input"]}]})
    );
    let kinds: Vec<InputKind> = ingested
        .document
        .nodes()
        .iter()
        .filter_map(|n| match n {
            Node::Input(i) => Some(i.kind),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec![InputKind::Email, InputKind::Password]);
}

#[test]
fn test_first_image_in_preorder_wins() {
    let raw = json!({
        "z": {"inner": ["https://a.test/first.png"]},
        "a": "https://a.test/second.png"
    });
    let doc = ingest(&raw, &IngestPolicy::default()).unwrap().document;
    match doc.find("img") {
        Some(Node::Image(img)) => assert_eq!(img.src, "https://a.test/first.png"),
        other => panic!("expected image, got {:?}", other),
    }
}

#[test]
fn test_no_pattern_is_definitive_rejection() {
    let err = ingest(&json!({"widgets": [1, 2, 3]}), &IngestPolicy::default()).unwrap_err();
    assert!(matches!(err, IngestError::ConversionMiss { .. }));
    assert_eq!(err.schema_errors().len(), 2);
}
