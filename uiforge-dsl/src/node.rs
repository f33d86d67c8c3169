use serde::{Deserialize, Serialize};

pub const DEFAULT_GAP: f64 = 12.0;
pub const DEFAULT_PADDING: f64 = 16.0;
pub const DEFAULT_INPUT_NAME: &str = "field";
pub const DEFAULT_DEBOUNCE_MS: u64 = 600;
pub const DEFAULT_IMAGE_RADIUS: f64 = 8.0;

/// Discriminant names, in catalog order.
pub const NODE_TYPES: &[&str] = &[
    "container", "card", "form", "text", "input", "button", "image",
];

/// One UI element. Canonical: every defaultable field is filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Container(Container),
    Card(Card),
    Form(Form),
    Text(Text),
    Input(Input),
    Button(Button),
    Image(Image),
}

/// Flex container laying children along one axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub id: String,
    pub direction: Direction,
    pub gap: f64,
    pub padding: f64,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Vertical,
    Horizontal,
}

/// Bordered, rounded block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub children: Vec<Node>,
    pub padding: f64,
}

/// Submission boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    pub id: String,
    pub children: Vec<Node>,
}

/// Literal text content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub id: String,
    pub content: String,
    pub variant: TextVariant,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextVariant {
    H1,
    H2,
    H3,
    #[default]
    P,
    Label,
}

/// Text input field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub kind: InputKind,
    #[serde(rename = "showToggle")]
    pub show_toggle: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    #[default]
    Text,
    Email,
    Password,
}

/// Debounced button
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Button {
    pub id: String,
    pub text: String,
    pub variant: ButtonVariant,
    #[serde(rename = "debounceMs")]
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonVariant {
    #[default]
    Primary,
    Secondary,
    Link,
}

/// Image with optional intrinsic size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub src: String,
    pub alt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    pub radius: f64,
}

impl Direction {
    pub const NAMES: &'static [&'static str] = &["vertical", "horizontal"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "vertical" => Some(Direction::Vertical),
            "horizontal" => Some(Direction::Horizontal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Vertical => "vertical",
            Direction::Horizontal => "horizontal",
        }
    }
}

impl TextVariant {
    pub const NAMES: &'static [&'static str] = &["h1", "h2", "h3", "p", "label"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "h1" => Some(TextVariant::H1),
            "h2" => Some(TextVariant::H2),
            "h3" => Some(TextVariant::H3),
            "p" => Some(TextVariant::P),
            "label" => Some(TextVariant::Label),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TextVariant::H1 => "h1",
            TextVariant::H2 => "h2",
            TextVariant::H3 => "h3",
            TextVariant::P => "p",
            TextVariant::Label => "label",
        }
    }
}

impl InputKind {
    pub const NAMES: &'static [&'static str] = &["text", "email", "password"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(InputKind::Text),
            "email" => Some(InputKind::Email),
            "password" => Some(InputKind::Password),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Text => "text",
            InputKind::Email => "email",
            InputKind::Password => "password",
        }
    }
}

impl ButtonVariant {
    pub const NAMES: &'static [&'static str] = &["primary", "secondary", "link"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "primary" => Some(ButtonVariant::Primary),
            "secondary" => Some(ButtonVariant::Secondary),
            "link" => Some(ButtonVariant::Link),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ButtonVariant::Primary => "primary",
            ButtonVariant::Secondary => "secondary",
            ButtonVariant::Link => "link",
        }
    }
}

impl Input {
    /// A reveal control is exposed only for password fields with the toggle enabled.
    pub fn has_reveal_control(&self) -> bool {
        self.kind == InputKind::Password && self.show_toggle
    }
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Node::Container(n) => &n.id,
            Node::Card(n) => &n.id,
            Node::Form(n) => &n.id,
            Node::Text(n) => &n.id,
            Node::Input(n) => &n.id,
            Node::Button(n) => &n.id,
            Node::Image(n) => &n.id,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Container(_) => "container",
            Node::Card(_) => "card",
            Node::Form(_) => "form",
            Node::Text(_) => "text",
            Node::Input(_) => "input",
            Node::Button(_) => "button",
            Node::Image(_) => "image",
        }
    }

    /// Children in render order; empty for leaf variants.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Container(n) => &n.children,
            Node::Card(n) => &n.children,
            Node::Form(n) => &n.children,
            Node::Text(_) | Node::Input(_) | Node::Button(_) | Node::Image(_) => &[],
        }
    }

    /// Pre-order traversal, which is also focus order.
    pub fn descendants(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        collect_preorder(self, &mut out);
        out
    }
}

fn collect_preorder<'a>(node: &'a Node, out: &mut Vec<&'a Node>) {
    out.push(node);
    for child in node.children() {
        collect_preorder(child, out);
    }
}
