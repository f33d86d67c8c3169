//! Live widget state for one mounted document.
//! Buttons debounce through a single cancellable timer; inputs hold a local
//! value and reveal state; forms swallow submission.

use dashmap::DashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use uiforge_dsl::{InputKind, Node, UiDocument};

/// Structural path of a node inside the mounted document, e.g. `root.children.1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceKey(String);

impl InstanceKey {
    pub fn root() -> Self {
        Self("root".to_string())
    }

    pub fn child(&self, index: usize) -> Self {
        Self(format!("{}.children.{}", self.0, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WidgetError {
    #[error("No widget mounted at {0}")]
    NotFound(InstanceKey),

    #[error("Widget at {key} is not a {expected}")]
    WrongKind { key: InstanceKey, expected: &'static str },

    #[error("Input at {0} has no reveal control")]
    NoRevealControl(InstanceKey),

    #[error("Button timers need a Tokio runtime")]
    NoRuntime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Idle,
    Busy,
}

/// What happened to one activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Accepted,
    /// Arrived inside the busy window and was ignored.
    Dropped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    Masked,
    Revealed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Default submission suppressed; nothing leaves the form.
    Prevented,
}

struct ButtonInner {
    state: ButtonState,
    timer: Option<JoinHandle<()>>,
}

fn lock(inner: &Mutex<ButtonInner>) -> MutexGuard<'_, ButtonInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Two-state debounced button. At most one pending timer per instance.
pub struct ButtonWidget {
    debounce: Duration,
    inner: Arc<Mutex<ButtonInner>>,
}

impl ButtonWidget {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            debounce: Duration::from_millis(debounce_ms),
            inner: Arc::new(Mutex::new(ButtonInner {
                state: ButtonState::Idle,
                timer: None,
            })),
        }
    }

    pub fn state(&self) -> ButtonState {
        lock(&self.inner).state
    }

    pub fn has_pending_timer(&self) -> bool {
        lock(&self.inner)
            .timer
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Idle → Busy, scheduling the single return to Idle. Busy → dropped.
    pub fn activate(&self) -> Result<Activation, WidgetError> {
        let mut inner = lock(&self.inner);
        if inner.state == ButtonState::Busy {
            tracing::trace!("activation dropped while busy");
            return Ok(Activation::Dropped);
        }
        let handle = tokio::runtime::Handle::try_current().map_err(|_| WidgetError::NoRuntime)?;

        inner.state = ButtonState::Busy;
        let weak: Weak<Mutex<ButtonInner>> = Arc::downgrade(&self.inner);
        // Measured from activation, not from when the task first runs
        let deadline = tokio::time::Instant::now() + self.debounce;
        inner.timer = Some(handle.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(inner) = weak.upgrade() {
                let mut inner = lock(&inner);
                inner.state = ButtonState::Idle;
                inner.timer = None;
            }
        }));
        Ok(Activation::Accepted)
    }

    /// Cancel any pending timer. The state is left as is; the widget is going away.
    pub fn teardown(&self) {
        if let Some(timer) = lock(&self.inner).timer.take() {
            timer.abort();
        }
    }
}

impl Drop for ButtonWidget {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Local text value plus reveal state for password fields.
#[derive(Debug, Clone, PartialEq)]
pub struct InputWidget {
    kind: InputKind,
    reveal_control: bool,
    value: String,
    reveal: RevealState,
}

impl InputWidget {
    pub fn new(kind: InputKind, reveal_control: bool) -> Self {
        Self {
            kind,
            reveal_control,
            value: String::new(),
            reveal: RevealState::Masked,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn reveal(&self) -> Option<RevealState> {
        self.reveal_control.then_some(self.reveal)
    }

    /// Whether the value is currently drawn masked.
    pub fn is_masked(&self) -> bool {
        self.kind == InputKind::Password && self.reveal == RevealState::Masked
    }
}

pub enum Widget {
    Button(ButtonWidget),
    Input(InputWidget),
    Form,
}

impl Widget {
    fn kind_name(&self) -> &'static str {
        match self {
            Widget::Button(_) => "button",
            Widget::Input(_) => "input",
            Widget::Form => "form",
        }
    }
}

/// Every live widget instance of one mounted document.
pub struct Mount {
    widgets: DashMap<InstanceKey, Widget>,
}

impl Mount {
    /// Fresh instances for every interactive node: inputs empty and masked, buttons idle.
    pub fn new(document: &UiDocument) -> Self {
        let widgets = DashMap::new();
        mount_node(&document.root, InstanceKey::root(), &widgets);
        tracing::debug!(widgets = widgets.len(), "document mounted");
        Self { widgets }
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn contains(&self, key: &InstanceKey) -> bool {
        self.widgets.contains_key(key)
    }

    pub fn activate_button(&self, key: &InstanceKey) -> Result<Activation, WidgetError> {
        let widget = self.get(key)?;
        match widget.value() {
            Widget::Button(b) => b.activate(),
            _ => Err(wrong_kind(key, "button")),
        }
    }

    pub fn button_state(&self, key: &InstanceKey) -> Result<ButtonState, WidgetError> {
        let widget = self.get(key)?;
        match widget.value() {
            Widget::Button(b) => Ok(b.state()),
            _ => Err(wrong_kind(key, "button")),
        }
    }

    pub fn toggle_reveal(&self, key: &InstanceKey) -> Result<RevealState, WidgetError> {
        let mut widget = self
            .widgets
            .get_mut(key)
            .ok_or_else(|| WidgetError::NotFound(key.clone()))?;
        match widget.value_mut() {
            Widget::Input(input) if input.reveal_control => {
                input.reveal = match input.reveal {
                    RevealState::Masked => RevealState::Revealed,
                    RevealState::Revealed => RevealState::Masked,
                };
                Ok(input.reveal)
            }
            Widget::Input(_) => Err(WidgetError::NoRevealControl(key.clone())),
            _ => Err(wrong_kind(key, "input")),
        }
    }

    pub fn set_input_value(&self, key: &InstanceKey, value: impl Into<String>) -> Result<(), WidgetError> {
        let mut widget = self
            .widgets
            .get_mut(key)
            .ok_or_else(|| WidgetError::NotFound(key.clone()))?;
        match widget.value_mut() {
            Widget::Input(input) => {
                input.value = value.into();
                Ok(())
            }
            _ => Err(wrong_kind(key, "input")),
        }
    }

    pub fn input(&self, key: &InstanceKey) -> Result<InputWidget, WidgetError> {
        let widget = self.get(key)?;
        match widget.value() {
            Widget::Input(input) => Ok(input.clone()),
            _ => Err(wrong_kind(key, "input")),
        }
    }

    pub fn input_value(&self, key: &InstanceKey) -> Result<String, WidgetError> {
        Ok(self.input(key)?.value)
    }

    pub fn submit_form(&self, key: &InstanceKey) -> Result<SubmitOutcome, WidgetError> {
        let widget = self.get(key)?;
        match widget.value() {
            Widget::Form => {
                tracing::debug!(key = %key, "form submission prevented");
                Ok(SubmitOutcome::Prevented)
            }
            _ => Err(wrong_kind(key, "form")),
        }
    }

    pub fn pending_timers(&self) -> usize {
        self.widgets
            .iter()
            .filter(|w| matches!(w.value(), Widget::Button(b) if b.has_pending_timer()))
            .count()
    }

    /// Cancel every pending timer and drop all instances.
    pub fn teardown(&self) {
        for widget in self.widgets.iter() {
            if let Widget::Button(b) = widget.value() {
                b.teardown();
            }
        }
        self.widgets.clear();
    }

    fn get(&self, key: &InstanceKey) -> Result<dashmap::mapref::one::Ref<'_, InstanceKey, Widget>, WidgetError> {
        self.widgets
            .get(key)
            .ok_or_else(|| WidgetError::NotFound(key.clone()))
    }
}

impl Drop for Mount {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn wrong_kind(key: &InstanceKey, expected: &'static str) -> WidgetError {
    WidgetError::WrongKind {
        key: key.clone(),
        expected,
    }
}

fn mount_node(node: &Node, key: InstanceKey, widgets: &DashMap<InstanceKey, Widget>) {
    let widget = match node {
        Node::Button(b) => Some(Widget::Button(ButtonWidget::new(b.debounce_ms))),
        Node::Input(i) => Some(Widget::Input(InputWidget::new(i.kind, i.has_reveal_control()))),
        Node::Form(_) => Some(Widget::Form),
        _ => None,
    };
    if let Some(widget) = widget {
        tracing::trace!(key = %key, kind = widget.kind_name(), "widget created");
        widgets.insert(key.clone(), widget);
    }
    for (i, child) in node.children().iter().enumerate() {
        mount_node(child, key.child(i), widgets);
    }
}

/// Instance key of the first node (pre-order) with the given id.
pub fn key_of(document: &UiDocument, id: &str) -> Option<InstanceKey> {
    fn walk(node: &Node, key: InstanceKey, id: &str) -> Option<InstanceKey> {
        if node.id() == id {
            return Some(key);
        }
        node.children()
            .iter()
            .enumerate()
            .find_map(|(i, child)| walk(child, key.child(i), id))
    }
    walk(&document.root, InstanceKey::root(), id)
}
