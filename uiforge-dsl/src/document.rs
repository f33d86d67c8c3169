use serde::{Deserialize, Serialize};
use crate::node::Node;
use crate::palette::Palette;

/// The only DSL version this crate understands.
pub const DSL_VERSION: &str = "0.1";

/// A canonical UI-DSL document.
///
/// Replaced wholesale on update; never patched field-by-field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiDocument {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<Palette>,
    pub root: Node,
}

impl UiDocument {
    pub fn new(root: Node) -> Self {
        Self {
            version: DSL_VERSION.to_string(),
            palette: None,
            root,
        }
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = Some(palette);
        self
    }

    /// All nodes in pre-order.
    pub fn nodes(&self) -> Vec<&Node> {
        self.root.descendants()
    }

    /// First node with the given id, in pre-order.
    pub fn find(&self, id: &str) -> Option<&Node> {
        self.nodes().into_iter().find(|n| n.id() == id)
    }

    pub fn to_json(&self) -> serde_json::Value {
        // Serialization of plain data types cannot fail
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn to_json_string_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
