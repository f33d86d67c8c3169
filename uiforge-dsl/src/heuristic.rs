use crate::document::UiDocument;
use crate::node::*;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// A best-effort reconstruction strategy for JSON the validator rejected.
///
/// Implementations must be deterministic: the same raw value always yields
/// the same document (fixed ids, no randomness).
pub trait Heuristic: Send + Sync {
    fn name(&self) -> &'static str;

    fn convert(&self, raw: &Value) -> Option<UiDocument>;
}

/// Outcome of a successful conversion
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub document: UiDocument,
    pub strategy: &'static str,
}

/// Tries registered strategies in order; first match wins.
pub struct HeuristicConverter {
    strategies: Vec<Box<dyn Heuristic>>,
}

impl Default for HeuristicConverter {
    fn default() -> Self {
        Self {
            strategies: vec![Box::new(KeywordLoginHeuristic)],
        }
    }
}

impl HeuristicConverter {
    /// Converter with no strategies registered.
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: impl Heuristic + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn convert(&self, raw: &Value) -> Option<Conversion> {
        for strategy in &self.strategies {
            if let Some(document) = strategy.convert(raw) {
                tracing::debug!(strategy = strategy.name(), "heuristic conversion matched");
                return Some(Conversion {
                    document,
                    strategy: strategy.name(),
                });
            }
        }
        tracing::debug!("no heuristic matched");
        None
    }
}

/// Keyword categories found in a raw value's text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeywordMatch {
    pub email: bool,
    pub password: bool,
    pub action: bool,
}

impl KeywordMatch {
    pub fn any(&self) -> bool {
        self.email || self.password || self.action
    }
}

const EMAIL_KEYWORDS: &[&str] = &["email"];
const PASSWORD_KEYWORDS: &[&str] = &["password", "senha"];
const ACTION_KEYWORDS: &[&str] = &["button", "continu", "login", "entrar"];

/// Scan keys and values of the whole value, case-insensitively.
pub fn match_keywords(raw: &Value) -> KeywordMatch {
    let blob = raw.to_string().to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| blob.contains(w));
    KeywordMatch {
        email: has(EMAIL_KEYWORDS),
        password: has(PASSWORD_KEYWORDS),
        action: has(ACTION_KEYWORDS),
    }
}

fn image_ref_regex() -> &'static Regex {
    static IMAGE_REF_REGEX: OnceLock<Regex> = OnceLock::new();
    IMAGE_REF_REGEX.get_or_init(|| {
        Regex::new(r"(?i)^data:image/|https?://|\.png$|\.jpe?g$").unwrap()
    })
}

/// Every string that looks like an image reference, in pre-order and source key order.
pub fn find_image_urls(raw: &Value) -> Vec<String> {
    let mut urls = Vec::new();
    walk_image_refs(raw, &mut urls);
    urls
}

fn walk_image_refs(value: &Value, urls: &mut Vec<String>) {
    match value {
        Value::String(s) if image_ref_regex().is_match(s) => urls.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|v| walk_image_refs(v, urls)),
        Value::Object(map) => map.values().for_each(|v| walk_image_refs(v, urls)),
        _ => {}
    }
}

/// Recognizes login-like screens by keyword, or a lone image.
pub struct KeywordLoginHeuristic;

impl Heuristic for KeywordLoginHeuristic {
    fn name(&self) -> &'static str {
        "keyword-login"
    }

    fn convert(&self, raw: &Value) -> Option<UiDocument> {
        let keywords = match_keywords(raw);
        let image = find_image_urls(raw).into_iter().next();

        if keywords.any() {
            return Some(UiDocument::new(login_screen(keywords, image)));
        }
        image.map(|src| UiDocument::new(image_card(src)))
    }
}

fn login_screen(keywords: KeywordMatch, image: Option<String>) -> Node {
    let mut fields = Vec::new();
    if keywords.email {
        fields.push(Node::Input(Input {
            id: "email".to_string(),
            name: "email".to_string(),
            label: None,
            placeholder: Some("Email".to_string()),
            kind: InputKind::Email,
            show_toggle: true,
        }));
    }
    if keywords.password {
        fields.push(Node::Input(Input {
            id: "pass".to_string(),
            name: "password".to_string(),
            label: None,
            placeholder: Some("Password".to_string()),
            kind: InputKind::Password,
            show_toggle: true,
        }));
    }
    if keywords.action {
        fields.push(Node::Button(Button {
            id: "cta".to_string(),
            text: "Continue".to_string(),
            variant: ButtonVariant::Primary,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }));
    }

    let mut children = Vec::new();
    if let Some(src) = image {
        children.push(image_node(src, "preview"));
    }
    children.push(Node::Text(Text {
        id: "title".to_string(),
        content: "Login".to_string(),
        variant: TextVariant::H2,
    }));
    children.push(Node::Form(Form {
        id: "form".to_string(),
        children: fields,
    }));

    Node::Container(Container {
        id: "root".to_string(),
        direction: Direction::Vertical,
        gap: DEFAULT_GAP,
        padding: DEFAULT_PADDING,
        children,
    })
}

fn image_card(src: String) -> Node {
    Node::Card(Card {
        id: "card".to_string(),
        padding: DEFAULT_PADDING,
        children: vec![
            image_node(src, "image"),
            Node::Text(Text {
                id: "tx".to_string(),
                content: "Imagem".to_string(),
                variant: TextVariant::H3,
            }),
        ],
    })
}

fn image_node(src: String, alt: &str) -> Node {
    Node::Image(Image {
        id: "img".to_string(),
        src,
        alt: alt.to_string(),
        width: None,
        height: None,
        radius: DEFAULT_IMAGE_RADIUS,
    })
}
