use crate::document::{UiDocument, DSL_VERSION};
use crate::error::{DslResult, IssueKind, IssuePath, SchemaErrors, SchemaIssue};
use crate::node::*;
use crate::palette::Palette;
use serde_json::{Map, Value};

const MAX_NESTING_DEPTH: usize = 64;
const RANDOM_ID_LEN: usize = 10;

/// How ids are assigned to nodes that arrive without one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdStrategy {
    /// Fresh random id on every validation pass.
    #[default]
    Random,
    /// Id derived from the node's path, stable across passes.
    Structural,
}

#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub id_strategy: IdStrategy,
    pub max_depth: usize,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            id_strategy: IdStrategy::Random,
            max_depth: MAX_NESTING_DEPTH,
        }
    }
}

impl ValidateOptions {
    pub fn structural_ids() -> Self {
        Self {
            id_strategy: IdStrategy::Structural,
            ..Self::default()
        }
    }
}

/// Validate and normalize a raw JSON value into a canonical document.
pub fn validate(raw: &Value) -> Result<UiDocument, SchemaErrors> {
    validate_with(raw, &ValidateOptions::default())
}

/// Validate with explicit options
pub fn validate_with(raw: &Value, options: &ValidateOptions) -> Result<UiDocument, SchemaErrors> {
    let mut v = Validator::new(options);
    let doc = v.document(raw);
    let result = v.finish(doc);
    match &result {
        Ok(doc) => tracing::debug!(nodes = doc.nodes().len(), "document validated"),
        Err(errors) => tracing::debug!(issues = errors.len(), "document rejected"),
    }
    result
}

/// Validate a single node (and its subtree) outside of a document.
pub fn validate_node(raw: &Value, options: &ValidateOptions) -> Result<Node, SchemaErrors> {
    let mut v = Validator::new(options);
    let node = v.node(raw, &IssuePath::root(), 0);
    v.finish(node)
}

/// Parse JSON text, then validate.
pub fn parse_document(json: &str) -> DslResult<UiDocument> {
    let raw: Value = serde_json::from_str(json)?;
    Ok(validate(&raw)?)
}

/// Accumulates issues across one pass; never stops at the first failure.
struct Validator<'o> {
    options: &'o ValidateOptions,
    issues: Vec<SchemaIssue>,
}

impl<'o> Validator<'o> {
    fn new(options: &'o ValidateOptions) -> Self {
        Self {
            options,
            issues: Vec::new(),
        }
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, SchemaErrors> {
        match value {
            Some(v) if self.issues.is_empty() => Ok(v),
            _ => Err(SchemaErrors(self.issues)),
        }
    }

    fn push(&mut self, path: IssuePath, kind: IssueKind, message: impl Into<String>) {
        self.issues.push(SchemaIssue {
            path,
            kind,
            message: message.into(),
        });
    }

    fn document(&mut self, raw: &Value) -> Option<UiDocument> {
        let path = IssuePath::root();
        let Some(obj) = self.object(raw, &path) else {
            return None;
        };

        let version_path = path.key("version");
        match present(obj, "version") {
            None => self.push(version_path, IssueKind::Missing, "Required"),
            Some(Value::String(v)) if v == DSL_VERSION => {}
            Some(_) => self.push(
                version_path,
                IssueKind::VersionMismatch,
                format!("Invalid literal value, expected \"{}\"", DSL_VERSION),
            ),
        }

        let palette = self.palette(obj, &path.key("palette"));

        let root_path = path.key("root");
        let root = match present(obj, "root") {
            Some(raw_root) => self.node(raw_root, &root_path, 0),
            None => {
                self.push(root_path, IssueKind::Missing, "Required");
                None
            }
        };

        root.map(|root| UiDocument {
            version: DSL_VERSION.to_string(),
            palette,
            root,
        })
    }

    fn palette(&mut self, obj: &Map<String, Value>, path: &IssuePath) -> Option<Palette> {
        let raw = present(obj, "palette")?;
        let Some(p) = self.object(raw, path) else {
            return None;
        };
        Some(Palette {
            primary: self.opt_string(p, "primary", path),
            secondary: self.opt_string(p, "secondary", path),
            background: self.opt_string(p, "background", path),
            foreground: self.opt_string(p, "foreground", path),
        })
    }

    fn node(&mut self, raw: &Value, path: &IssuePath, depth: usize) -> Option<Node> {
        if depth > self.options.max_depth {
            self.push(
                path.clone(),
                IssueKind::TooDeep,
                format!("Nesting exceeds maximum depth of {}", self.options.max_depth),
            );
            return None;
        }
        let obj = self.object(raw, path)?;

        let type_path = path.key("type");
        let type_name = match present(obj, "type") {
            Some(Value::String(t)) => t.as_str(),
            Some(other) => {
                self.push(
                    type_path,
                    IssueKind::InvalidType,
                    format!("Expected string, received {}", json_type(other)),
                );
                return None;
            }
            None => {
                self.push(type_path, IssueKind::Missing, "Required");
                return None;
            }
        };

        let id = self.id(obj, path);
        match type_name {
            "container" => Some(Node::Container(self.container(obj, path, depth, id))),
            "card" => Some(Node::Card(self.card(obj, path, depth, id))),
            "form" => Some(Node::Form(self.form(obj, path, depth, id))),
            "text" => Some(Node::Text(self.text(obj, path, id))),
            "input" => Some(Node::Input(self.input(obj, path, id))),
            "button" => Some(Node::Button(self.button(obj, path, id))),
            "image" => Some(Node::Image(self.image(obj, path, id))),
            other => {
                self.push(
                    type_path,
                    IssueKind::UnknownType,
                    format!(
                        "Invalid discriminator value. Expected {}, received '{}'",
                        quoted_list(NODE_TYPES),
                        other
                    ),
                );
                None
            }
        }
    }

    fn id(&mut self, obj: &Map<String, Value>, path: &IssuePath) -> String {
        match self.opt_string(obj, "id", path) {
            Some(id) => id,
            None => match self.options.id_strategy {
                IdStrategy::Random => random_id(),
                IdStrategy::Structural => structural_id(path),
            },
        }
    }

    fn children(&mut self, obj: &Map<String, Value>, path: &IssuePath, depth: usize) -> Vec<Node> {
        let children_path = path.key("children");
        let Some(raw) = present(obj, "children") else {
            return Vec::new();
        };
        let Value::Array(items) = raw else {
            self.push(
                children_path,
                IssueKind::InvalidType,
                format!("Expected array, received {}", json_type(raw)),
            );
            return Vec::new();
        };
        items
            .iter()
            .enumerate()
            .filter_map(|(i, child)| self.node(child, &children_path.index(i), depth + 1))
            .collect()
    }

    // --- Variant validators ---

    fn container(&mut self, obj: &Map<String, Value>, path: &IssuePath, depth: usize, id: String) -> Container {
        let direction = self.enum_or(obj, "direction", path, Direction::parse, Direction::NAMES, Direction::Vertical);
        let gap = self.number_or(obj, "gap", path, DEFAULT_GAP);
        let padding = self.number_or(obj, "padding", path, DEFAULT_PADDING);
        let children = self.children(obj, path, depth);
        Container {
            id,
            direction,
            gap,
            padding,
            children,
        }
    }

    fn card(&mut self, obj: &Map<String, Value>, path: &IssuePath, depth: usize, id: String) -> Card {
        let children = self.children(obj, path, depth);
        let padding = self.number_or(obj, "padding", path, DEFAULT_PADDING);
        Card { id, children, padding }
    }

    fn form(&mut self, obj: &Map<String, Value>, path: &IssuePath, depth: usize, id: String) -> Form {
        let children = self.children(obj, path, depth);
        Form { id, children }
    }

    fn text(&mut self, obj: &Map<String, Value>, path: &IssuePath, id: String) -> Text {
        let content = self.req_string(obj, "content", path);
        let variant = self.enum_or(obj, "variant", path, TextVariant::parse, TextVariant::NAMES, TextVariant::P);
        Text { id, content, variant }
    }

    fn input(&mut self, obj: &Map<String, Value>, path: &IssuePath, id: String) -> Input {
        let name = self
            .opt_string(obj, "name", path)
            .unwrap_or_else(|| DEFAULT_INPUT_NAME.to_string());
        let label = self.opt_string(obj, "label", path);
        let placeholder = self.opt_string(obj, "placeholder", path);
        let kind = self.enum_or(obj, "kind", path, InputKind::parse, InputKind::NAMES, InputKind::Text);
        let show_toggle = self.bool_or(obj, "showToggle", path, true);
        Input {
            id,
            name,
            label,
            placeholder,
            kind,
            show_toggle,
        }
    }

    fn button(&mut self, obj: &Map<String, Value>, path: &IssuePath, id: String) -> Button {
        let text = self.req_string(obj, "text", path);
        let variant = self.enum_or(
            obj,
            "variant",
            path,
            ButtonVariant::parse,
            ButtonVariant::NAMES,
            ButtonVariant::Primary,
        );
        let debounce = self.number_or(obj, "debounceMs", path, DEFAULT_DEBOUNCE_MS as f64);
        Button {
            id,
            text,
            variant,
            // A negative delay means no delay
            debounce_ms: debounce.max(0.0).round() as u64,
        }
    }

    fn image(&mut self, obj: &Map<String, Value>, path: &IssuePath, id: String) -> Image {
        let src = self.req_string(obj, "src", path);
        let alt = self.opt_string(obj, "alt", path).unwrap_or_default();
        let width = self.opt_number(obj, "width", path);
        let height = self.opt_number(obj, "height", path);
        let radius = self.number_or(obj, "radius", path, DEFAULT_IMAGE_RADIUS);
        Image {
            id,
            src,
            alt,
            width,
            height,
            radius,
        }
    }

    // --- Field helpers ---

    fn object<'v>(&mut self, raw: &'v Value, path: &IssuePath) -> Option<&'v Map<String, Value>> {
        match raw {
            Value::Object(obj) => Some(obj),
            other => {
                self.push(
                    path.clone(),
                    IssueKind::InvalidType,
                    format!("Expected object, received {}", json_type(other)),
                );
                None
            }
        }
    }

    fn req_string(&mut self, obj: &Map<String, Value>, key: &str, path: &IssuePath) -> String {
        if present(obj, key).is_none() {
            self.push(path.key(key), IssueKind::Missing, "Required");
            return String::new();
        }
        self.opt_string(obj, key, path).unwrap_or_default()
    }

    fn opt_string(&mut self, obj: &Map<String, Value>, key: &str, path: &IssuePath) -> Option<String> {
        match present(obj, key)? {
            Value::String(s) => Some(s.clone()),
            other => {
                self.push(
                    path.key(key),
                    IssueKind::InvalidType,
                    format!("Expected string, received {}", json_type(other)),
                );
                None
            }
        }
    }

    fn bool_or(&mut self, obj: &Map<String, Value>, key: &str, path: &IssuePath, default: bool) -> bool {
        match present(obj, key) {
            None => default,
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                self.push(
                    path.key(key),
                    IssueKind::InvalidType,
                    format!("Expected boolean, received {}", json_type(other)),
                );
                default
            }
        }
    }

    /// Any JSON number is accepted, negative included.
    fn opt_number(&mut self, obj: &Map<String, Value>, key: &str, path: &IssuePath) -> Option<f64> {
        let raw = present(obj, key)?;
        let Some(n) = raw.as_f64() else {
            self.push(
                path.key(key),
                IssueKind::InvalidType,
                format!("Expected number, received {}", json_type(raw)),
            );
            return None;
        };
        Some(n)
    }

    fn number_or(&mut self, obj: &Map<String, Value>, key: &str, path: &IssuePath, default: f64) -> f64 {
        self.opt_number(obj, key, path).unwrap_or(default)
    }

    fn enum_or<T: Copy>(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        path: &IssuePath,
        parse: fn(&str) -> Option<T>,
        names: &[&str],
        default: T,
    ) -> T {
        match present(obj, key) {
            None => default,
            Some(Value::String(s)) => match parse(s) {
                Some(v) => v,
                None => {
                    self.push(
                        path.key(key),
                        IssueKind::InvalidEnum,
                        format!(
                            "Invalid enum value. Expected {}, received '{}'",
                            quoted_list(names),
                            s
                        ),
                    );
                    default
                }
            },
            Some(other) => {
                self.push(
                    path.key(key),
                    IssueKind::InvalidType,
                    format!("Expected string, received {}", json_type(other)),
                );
                default
            }
        }
    }
}

/// A field counts as present unless it is absent or `null`.
fn present<'v>(obj: &'v Map<String, Value>, key: &str) -> Option<&'v Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn quoted_list(names: &[&str]) -> String {
    names
        .iter()
        .map(|n| format!("'{}'", n))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn random_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(RANDOM_ID_LEN);
    id
}

fn structural_id(path: &IssuePath) -> String {
    if path.is_empty() {
        return "node".to_string();
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kinds(errors: &SchemaErrors) -> Vec<IssueKind> {
        errors.issues().iter().map(|i| i.kind).collect()
    }

    #[test]
    fn test_text_defaults() {
        let doc = validate(&json!({"version": "0.1", "root": {"type": "text", "content": "Hi"}})).unwrap();
        match &doc.root {
            Node::Text(t) => {
                assert_eq!(t.content, "Hi");
                assert_eq!(t.variant, TextVariant::P);
                assert_eq!(t.id.len(), RANDOM_ID_LEN);
            }
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_random_ids_differ_between_passes() {
        let raw = json!({"version": "0.1", "root": {"type": "form"}});
        let a = validate(&raw).unwrap();
        let b = validate(&raw).unwrap();
        assert_ne!(a.root.id(), b.root.id());
    }

    #[test]
    fn test_structural_ids_are_stable() {
        let raw = json!({"version": "0.1", "root": {"type": "card", "children": [{"type": "text", "content": "x"}]}});
        let options = ValidateOptions::structural_ids();
        let a = validate_with(&raw, &options).unwrap();
        let b = validate_with(&raw, &options).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.root.id(), "root");
        assert_eq!(a.root.children()[0].id(), "root.children.0");
    }

    #[test]
    fn test_explicit_id_preserved() {
        let doc = validate(&json!({"version": "0.1", "root": {"type": "form", "id": "signup"}})).unwrap();
        assert_eq!(doc.root.id(), "signup");
    }

    #[test]
    fn test_version_mismatch() {
        let errors = validate(&json!({"version": "0.2", "root": {"type": "form"}})).unwrap_err();
        assert_eq!(kinds(&errors), vec![IssueKind::VersionMismatch]);
        assert!(errors.has_version_mismatch());
    }

    #[test]
    fn test_missing_version_is_not_a_mismatch() {
        let errors = validate(&json!({"root": {"type": "form"}})).unwrap_err();
        assert_eq!(kinds(&errors), vec![IssueKind::Missing]);
        assert!(!errors.has_version_mismatch());
    }

    #[test]
    fn test_unknown_type() {
        let errors = validate(&json!({"version": "0.1", "root": {"type": "divider"}})).unwrap_err();
        assert_eq!(kinds(&errors), vec![IssueKind::UnknownType]);
        assert_eq!(errors.issues()[0].path.to_string(), "root.type");
    }

    #[test]
    fn test_errors_accumulate_across_tree() {
        let raw = json!({
            "version": "0.1",
            "root": {
                "type": "container",
                "direction": "diagonal",
                "children": [
                    {"type": "text"},
                    {"type": "button", "text": "Go", "debounceMs": "soon"},
                    {"type": "image", "src": 3}
                ]
            }
        });
        let errors = validate(&raw).unwrap_err();
        let paths: Vec<String> = errors.issues().iter().map(|i| i.path.to_string()).collect();
        assert_eq!(
            paths,
            vec![
                "root.direction",
                "root.children.0.content",
                "root.children.1.debounceMs",
                "root.children.2.src",
            ]
        );
    }

    #[test]
    fn test_non_object_root() {
        let errors = validate(&json!([1, 2])).unwrap_err();
        assert_eq!(errors.to_string(), "(document): Expected object, received array");
    }

    #[test]
    fn test_null_treated_as_absent() {
        let doc = validate(&json!({
            "version": "0.1",
            "palette": null,
            "root": {"type": "input", "label": null}
        }))
        .unwrap();
        assert!(doc.palette.is_none());
        match doc.root {
            Node::Input(i) => {
                assert!(i.label.is_none());
                assert_eq!(i.name, DEFAULT_INPUT_NAME);
            }
            _ => panic!("expected input"),
        }
    }

    #[test]
    fn test_negative_numbers_accepted() {
        let doc = validate(&json!({
            "version": "0.1",
            "root": {"type": "container", "gap": -4, "children": [
                {"type": "image", "src": "a.png", "width": -1},
                {"type": "button", "text": "Go", "debounceMs": -250}
            ]}
        }))
        .unwrap();
        let Node::Container(c) = &doc.root else { panic!("expected container") };
        assert_eq!(c.gap, -4.0);
        match &c.children[0] {
            Node::Image(img) => assert_eq!(img.width, Some(-1.0)),
            other => panic!("expected image, got {:?}", other),
        }
        match &c.children[1] {
            Node::Button(b) => assert_eq!(b.debounce_ms, 0),
            other => panic!("expected button, got {:?}", other),
        }
    }

    #[test]
    fn test_depth_bound() {
        let mut raw = json!({"type": "text", "content": "leaf"});
        for _ in 0..5 {
            raw = json!({"type": "form", "children": [raw]});
        }
        let options = ValidateOptions {
            max_depth: 3,
            ..ValidateOptions::default()
        };
        let errors = validate_node(&raw, &options).unwrap_err();
        assert_eq!(kinds(&errors), vec![IssueKind::TooDeep]);
    }

    #[test]
    fn test_parse_document_reports_bad_json() {
        assert!(matches!(parse_document("{not json"), Err(crate::DslError::Json(_))));
    }
}
