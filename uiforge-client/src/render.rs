//! Interprets a canonical document into a renderer-neutral element tree and
//! serializes it to safe HTML. No script, no inline event handlers.

use crate::widgets::{ButtonState, InstanceKey, Mount, RevealState};
use serde_json::Value;
use std::fmt::Write;
use uiforge_dsl::node::NODE_TYPES;
use uiforge_dsl::{
    validate_node, ButtonVariant, Direction, InputKind, Node, TextVariant, UiDocument,
    ValidateOptions,
};

/// Label shown on a button during its busy window.
pub const BUSY_LABEL: &str = "Aguarde…";

const FORM_GAP: f64 = 10.0;
const CARD_RADIUS: f64 = 12.0;
const CARD_BORDER: &str = "1px solid #e5e7eb";

/// Base document styles. Per-node layout is inlined.
const BASE_STYLES: &str = "body{margin:0;font-family:system-ui,sans-serif;}\
input{padding:10px 12px;border:1px solid #cbd5e1;border-radius:8px;}\
.uf-field{display:grid;gap:6px;}\
.uf-reveal{background:transparent;border:none;color:#94a3b8;cursor:pointer;font-size:12px;}\
.uf-placeholder{padding:8px;border:1px dashed #f59e0b;color:#b45309;font-size:12px;}";

/// One rendered element.
#[derive(Debug, Clone, PartialEq)]
pub enum Presentation {
    Flex {
        id: String,
        key: InstanceKey,
        direction: Direction,
        gap: f64,
        padding: f64,
        children: Vec<Presentation>,
    },
    Card {
        id: String,
        key: InstanceKey,
        padding: f64,
        children: Vec<Presentation>,
    },
    Form {
        id: String,
        key: InstanceKey,
        children: Vec<Presentation>,
    },
    Text {
        id: String,
        key: InstanceKey,
        level: TextVariant,
        content: String,
    },
    Input {
        id: String,
        key: InstanceKey,
        name: String,
        label: Option<String>,
        placeholder: Option<String>,
        mode: InputKind,
        value: String,
        /// `None` when no reveal control is exposed.
        reveal: Option<RevealState>,
    },
    Button {
        id: String,
        key: InstanceKey,
        text: String,
        variant: ButtonVariant,
        state: ButtonState,
    },
    Image {
        id: String,
        key: InstanceKey,
        src: String,
        alt: String,
        width: Option<f64>,
        height: Option<f64>,
        radius: f64,
    },
    /// Node type this renderer does not know.
    Unsupported { key: InstanceKey, type_name: String },
    /// Known type whose fields failed to decode.
    Invalid {
        key: InstanceKey,
        type_name: String,
        message: String,
    },
}

impl Presentation {
    pub fn key(&self) -> &InstanceKey {
        match self {
            Presentation::Flex { key, .. }
            | Presentation::Card { key, .. }
            | Presentation::Form { key, .. }
            | Presentation::Text { key, .. }
            | Presentation::Input { key, .. }
            | Presentation::Button { key, .. }
            | Presentation::Image { key, .. }
            | Presentation::Unsupported { key, .. }
            | Presentation::Invalid { key, .. } => key,
        }
    }

    pub fn children(&self) -> &[Presentation] {
        match self {
            Presentation::Flex { children, .. }
            | Presentation::Card { children, .. }
            | Presentation::Form { children, .. } => children,
            _ => &[],
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Presentation>> {
        match self {
            Presentation::Flex { children, .. }
            | Presentation::Card { children, .. }
            | Presentation::Form { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Whether this element or any descendant is a placeholder.
    pub fn has_faults(&self) -> bool {
        matches!(
            self,
            Presentation::Unsupported { .. } | Presentation::Invalid { .. }
        ) || self.children().iter().any(Presentation::has_faults)
    }

    /// Body fragment only.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = element_to_html(self, &mut out);
        out
    }

    /// Complete standalone page.
    pub fn to_html_page(&self, title: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{}</title>
<style>{}</style>
</head>
<body>
{}
</body>
</html>
"#,
            escape_html(title),
            BASE_STYLES,
            self.to_html()
        )
    }
}

/// Interpret a canonical document. With a mount, live widget state is used;
/// without one, every widget renders in its freshly mounted state.
pub fn render_document(document: &UiDocument, mount: Option<&Mount>) -> Presentation {
    render_node(&document.root, InstanceKey::root(), mount)
}

fn render_node(node: &Node, key: InstanceKey, mount: Option<&Mount>) -> Presentation {
    let children = |nodes: &[Node]| -> Vec<Presentation> {
        nodes
            .iter()
            .enumerate()
            .map(|(i, child)| render_node(child, key.child(i), mount))
            .collect()
    };
    match node {
        Node::Container(c) => Presentation::Flex {
            id: c.id.clone(),
            direction: c.direction,
            gap: c.gap,
            padding: c.padding,
            children: children(&c.children),
            key,
        },
        Node::Card(c) => Presentation::Card {
            id: c.id.clone(),
            padding: c.padding,
            children: children(&c.children),
            key,
        },
        Node::Form(f) => Presentation::Form {
            id: f.id.clone(),
            children: children(&f.children),
            key,
        },
        Node::Text(t) => Presentation::Text {
            id: t.id.clone(),
            level: t.variant,
            content: t.content.clone(),
            key,
        },
        Node::Input(i) => {
            let live = mount.and_then(|m| m.input(&key).ok());
            let (value, reveal) = match live {
                Some(w) => (w.value().to_string(), w.reveal()),
                None => (
                    String::new(),
                    i.has_reveal_control().then_some(RevealState::Masked),
                ),
            };
            Presentation::Input {
                id: i.id.clone(),
                name: i.name.clone(),
                label: i.label.clone(),
                placeholder: i.placeholder.clone(),
                mode: i.kind,
                value,
                reveal,
                key,
            }
        }
        Node::Button(b) => Presentation::Button {
            id: b.id.clone(),
            text: b.text.clone(),
            variant: b.variant,
            state: mount
                .and_then(|m| m.button_state(&key).ok())
                .unwrap_or(ButtonState::Idle),
            key,
        },
        Node::Image(img) => Presentation::Image {
            id: img.id.clone(),
            src: img.src.clone(),
            alt: img.alt.clone(),
            width: img.width,
            height: img.height,
            radius: img.radius,
            key,
        },
    }
}

/// Lenient interpretation of an unvalidated tree.
///
/// Accepts a document (`{root: ...}`) or a bare node. Each node is decoded on
/// its own; unknown or invalid nodes become placeholders while siblings and
/// ancestors render normally. Nodes nested beyond the validator's depth
/// bound become placeholders.
pub fn render_value(raw: &Value) -> Presentation {
    let root = raw.get("root").unwrap_or(raw);
    render_value_node(root, InstanceKey::root(), 0, &ValidateOptions::default())
}

fn render_value_node(raw: &Value, key: InstanceKey, depth: usize, options: &ValidateOptions) -> Presentation {
    if depth > options.max_depth {
        return Presentation::Invalid {
            key,
            type_name: String::new(),
            message: format!("Nesting exceeds maximum depth of {}", options.max_depth),
        };
    }
    let Some(obj) = raw.as_object() else {
        return Presentation::Invalid {
            key,
            type_name: String::new(),
            message: "node is not an object".to_string(),
        };
    };
    let type_name = obj.get("type").and_then(Value::as_str).unwrap_or_default();
    if !NODE_TYPES.contains(&type_name) {
        tracing::debug!(key = %key, type_name, "unsupported node rendered as placeholder");
        return Presentation::Unsupported {
            key,
            type_name: type_name.to_string(),
        };
    }

    // Decode this node alone; children are handled one by one below.
    let mut shallow = obj.clone();
    let raw_children = shallow.remove("children");
    shallow
        .entry("id")
        .or_insert_with(|| Value::String(key.to_string()));

    let node = match validate_node(&Value::Object(shallow), options) {
        Ok(node) => node,
        Err(errors) => {
            tracing::debug!(key = %key, %errors, "invalid node rendered as placeholder");
            return Presentation::Invalid {
                key,
                type_name: type_name.to_string(),
                message: errors.to_string(),
            };
        }
    };

    let mut element = render_node(&node, key.clone(), None);
    if let Some(children) = element.children_mut() {
        match raw_children {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                *children = items
                    .iter()
                    .enumerate()
                    .map(|(i, child)| render_value_node(child, key.child(i), depth + 1, options))
                    .collect();
            }
            Some(_) => {
                return Presentation::Invalid {
                    key,
                    type_name: type_name.to_string(),
                    message: "children: Expected array".to_string(),
                }
            }
        }
    }
    element
}

pub(crate) fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Build id and instance-key attributes.
fn build_attrs(id: &str, key: &InstanceKey) -> String {
    let id_part = if id.is_empty() {
        String::new()
    } else {
        format!(" id=\"{}\"", escape_html(id))
    };
    format!("{} data-key=\"{}\"", id_part, escape_html(key.as_str()))
}

fn button_css(variant: ButtonVariant) -> &'static str {
    match variant {
        ButtonVariant::Primary => "background:#0ea5e9;color:white;border:1px solid #0284c7;",
        ButtonVariant::Secondary => "background:#111827;color:#e5e7eb;border:1px solid #334155;",
        ButtonVariant::Link => "background:transparent;color:#0ea5e9;border:none;",
    }
}

fn text_tag(level: TextVariant) -> &'static str {
    match level {
        TextVariant::H1 => "h1",
        TextVariant::H2 => "h2",
        TextVariant::H3 => "h3",
        TextVariant::Label => "label",
        TextVariant::P => "p",
    }
}

fn autocomplete(mode: InputKind) -> &'static str {
    match mode {
        InputKind::Password => "current-password",
        InputKind::Email => "email",
        InputKind::Text => "off",
    }
}

fn children_to_html(children: &[Presentation], out: &mut String) -> std::fmt::Result {
    for ch in children {
        element_to_html(ch, out)?;
    }
    Ok(())
}

fn element_to_html(p: &Presentation, out: &mut String) -> std::fmt::Result {
    match p {
        Presentation::Flex {
            id,
            key,
            direction,
            gap,
            padding,
            children,
        } => {
            let dir = match direction {
                Direction::Vertical => "column",
                Direction::Horizontal => "row",
            };
            write!(
                out,
                "<div{} style=\"display:flex;flex-direction:{};gap:{}px;padding:{}px;\">",
                build_attrs(id, key),
                dir,
                gap,
                padding
            )?;
            children_to_html(children, out)?;
            write!(out, "</div>")?;
        }
        Presentation::Card {
            id,
            key,
            padding,
            children,
        } => {
            write!(
                out,
                "<div{} style=\"border:{};border-radius:{}px;padding:{}px;display:flex;flex-direction:column;\">",
                build_attrs(id, key),
                CARD_BORDER,
                CARD_RADIUS,
                padding
            )?;
            children_to_html(children, out)?;
            write!(out, "</div>")?;
        }
        Presentation::Form { id, key, children } => {
            write!(
                out,
                "<form{} novalidate><div style=\"display:grid;gap:{}px;\">",
                build_attrs(id, key),
                FORM_GAP
            )?;
            children_to_html(children, out)?;
            write!(out, "</div></form>")?;
        }
        Presentation::Text {
            id,
            key,
            level,
            content,
        } => {
            let tag = text_tag(*level);
            write!(out, "<{}{}>{}</{}>", tag, build_attrs(id, key), escape_html(content), tag)?;
        }
        Presentation::Input {
            id,
            key,
            name,
            label,
            placeholder,
            mode,
            value,
            reveal,
        } => {
            write!(out, "<div class=\"uf-field\">")?;
            if let Some(label) = label {
                write!(out, "<label for=\"{}\">{}</label>", escape_html(id), escape_html(label))?;
            }
            let input_type = match (mode, reveal) {
                (InputKind::Password, Some(RevealState::Revealed)) => "text",
                _ => mode.as_str(),
            };
            let placeholder_attr = placeholder
                .as_ref()
                .map(|p| format!(" placeholder=\"{}\"", escape_html(p)))
                .unwrap_or_default();
            write!(
                out,
                "<input{} type=\"{}\" name=\"{}\" value=\"{}\" autocomplete=\"{}\"{}>",
                build_attrs(id, key),
                input_type,
                escape_html(name),
                escape_html(value),
                autocomplete(*mode),
                placeholder_attr
            )?;
            if let Some(reveal) = reveal {
                let (label, text) = match reveal {
                    RevealState::Masked => ("Mostrar senha", "Mostrar"),
                    RevealState::Revealed => ("Ocultar senha", "Ocultar"),
                };
                write!(
                    out,
                    "<button type=\"button\" class=\"uf-reveal\" aria-label=\"{}\">{}</button>",
                    label, text
                )?;
            }
            write!(out, "</div>")?;
        }
        Presentation::Button {
            id,
            key,
            text,
            variant,
            state,
        } => {
            let busy = *state == ButtonState::Busy;
            write!(
                out,
                "<button{} type=\"button\" style=\"{}border-radius:8px;padding:8px 12px;\"{}>{}</button>",
                build_attrs(id, key),
                button_css(*variant),
                if busy { " disabled" } else { "" },
                if busy { BUSY_LABEL.to_string() } else { escape_html(text) }
            )?;
        }
        Presentation::Image {
            id,
            key,
            src,
            alt,
            width,
            height,
            radius,
        } => {
            let mut size = String::new();
            if let Some(w) = width {
                write!(size, " width=\"{}\"", w)?;
            }
            if let Some(h) = height {
                write!(size, " height=\"{}\"", h)?;
            }
            write!(
                out,
                "<img{} src=\"{}\" alt=\"{}\"{} style=\"border-radius:{}px;\">",
                build_attrs(id, key),
                escape_html(src),
                escape_html(alt),
                size,
                radius
            )?;
        }
        Presentation::Unsupported { key, type_name } => {
            write!(
                out,
                "<div class=\"uf-placeholder\" data-key=\"{}\">unsupported: {}</div>",
                escape_html(key.as_str()),
                escape_html(type_name)
            )?;
        }
        Presentation::Invalid {
            key,
            type_name,
            message,
        } => {
            write!(
                out,
                "<div class=\"uf-placeholder\" data-key=\"{}\">invalid {}: {}</div>",
                escape_html(key.as_str()),
                escape_html(type_name),
                escape_html(message)
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uiforge_dsl::validate;

    fn doc(root: Value) -> UiDocument {
        validate(&json!({"version": "0.1", "root": root})).unwrap()
    }

    #[test]
    fn test_text_is_escaped() {
        let d = doc(json!({"type": "text", "id": "t", "content": "<script>alert(1)</script>", "variant": "h2"}));
        let html = render_document(&d, None).to_html();
        assert_eq!(
            html,
            "<h2 id=\"t\" data-key=\"root\">&lt;script&gt;alert(1)&lt;/script&gt;</h2>"
        );
    }

    #[test]
    fn test_container_layout() {
        let d = doc(json!({"type": "container", "id": "c", "direction": "horizontal", "gap": 4}));
        let html = render_document(&d, None).to_html();
        assert!(html.contains("flex-direction:row;gap:4px;padding:16px;"));
    }

    #[test]
    fn test_children_in_order() {
        let d = doc(json!({"type": "card", "children": [
            {"type": "text", "id": "b", "content": "B"},
            {"type": "text", "id": "a", "content": "A"}
        ]}));
        let p = render_document(&d, None);
        let keys: Vec<&str> = p.children().iter().map(|c| c.key().as_str()).collect();
        assert_eq!(keys, vec!["root.children.0", "root.children.1"]);
        let html = p.to_html();
        assert!(html.find(">B<").unwrap() < html.find(">A<").unwrap());
    }

    #[test]
    fn test_password_reveal_control() {
        let d = doc(json!({"type": "form", "children": [
            {"type": "input", "id": "p", "kind": "password", "label": "Senha"},
            {"type": "input", "id": "q", "kind": "password", "showToggle": false}
        ]}));
        let p = render_document(&d, None);
        match &p.children()[0] {
            Presentation::Input { reveal, .. } => assert_eq!(*reveal, Some(RevealState::Masked)),
            other => panic!("expected input, got {:?}", other),
        }
        match &p.children()[1] {
            Presentation::Input { reveal, .. } => assert_eq!(*reveal, None),
            other => panic!("expected input, got {:?}", other),
        }
        let html = p.to_html();
        assert!(html.contains("<label for=\"p\">Senha</label>"));
        assert!(html.contains("autocomplete=\"current-password\""));
        assert_eq!(html.matches("uf-reveal").count(), 1);
    }

    #[test]
    fn test_button_styles() {
        let d = doc(json!({"type": "button", "id": "b", "text": "Go", "variant": "secondary"}));
        let html = render_document(&d, None).to_html();
        assert!(html.contains("background:#111827;color:#e5e7eb;border:1px solid #334155;"));
        assert!(!html.contains("disabled"));
    }

    #[test]
    fn test_lenient_unknown_type_isolated() {
        let raw = json!({
            "version": "0.1",
            "root": {"type": "container", "children": [
                {"type": "text", "content": "before"},
                {"type": "carousel", "items": []},
                {"type": "button"},
                {"type": "text", "content": "after"}
            ]}
        });
        let p = render_value(&raw);
        assert!(p.has_faults());
        let children = p.children();
        assert_eq!(children.len(), 4);
        assert!(matches!(&children[1], Presentation::Unsupported { type_name, .. } if type_name == "carousel"));
        assert!(matches!(&children[2], Presentation::Invalid { type_name, .. } if type_name == "button"));
        assert!(matches!(&children[3], Presentation::Text { content, .. } if content == "after"));
        assert!(p.to_html().contains("unsupported: carousel"));
    }

    #[test]
    fn test_lenient_bare_node() {
        let p = render_value(&json!({"type": "image", "src": "a.png", "width": 40}));
        match p {
            Presentation::Image { id, width, radius, .. } => {
                assert_eq!(id, "root");
                assert_eq!(width, Some(40.0));
                assert_eq!(radius, 8.0);
            }
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_lenient_depth_bound() {
        let mut raw = json!({"type": "text", "content": "leaf"});
        for _ in 0..100 {
            raw = json!({"type": "container", "children": [raw]});
        }
        let mut node = &render_value(&raw);
        let mut depth = 0;
        while let [child] = node.children() {
            node = child;
            depth += 1;
        }
        assert_eq!(depth, 65);
        match node {
            Presentation::Invalid { message, .. } => assert_eq!(message, "Nesting exceeds maximum depth of 64"),
            other => panic!("expected placeholder, got {:?}", other),
        }
    }
}
