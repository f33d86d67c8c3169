//! Accessibility QA report for a canonical document.

use crate::widgets::InstanceKey;
use chrono::{DateTime, Utc};
use std::fmt::Write;
use uiforge_dsl::{ContrastCheck, Node, UiDocument, WCAG_AA};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Fail,
    /// Needs a human look.
    Pending,
}

/// One focusable element, in tab order.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusStop {
    pub key: InstanceKey,
    pub id: String,
    pub kind: &'static str,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChecklistItem {
    pub label: &'static str,
    pub status: CheckStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QaReport {
    pub focus_order: Vec<FocusStop>,
    /// Ids of images whose alt text is empty.
    pub images_missing_alt: Vec<String>,
    /// Ids of inputs rendered without a label.
    pub inputs_missing_label: Vec<String>,
    pub contrast: Option<ContrastCheck>,
}

impl QaReport {
    pub fn analyze(document: &UiDocument) -> Self {
        let mut report = QaReport {
            focus_order: Vec::new(),
            images_missing_alt: Vec::new(),
            inputs_missing_label: Vec::new(),
            contrast: document.palette.as_ref().and_then(|p| p.text_contrast()),
        };
        report.visit(&document.root, InstanceKey::root());
        report
    }

    fn visit(&mut self, node: &Node, key: InstanceKey) {
        match node {
            Node::Input(i) => {
                if i.label.as_deref().map_or(true, |l| l.trim().is_empty()) {
                    self.inputs_missing_label.push(i.id.clone());
                }
                let label = i
                    .label
                    .clone()
                    .or_else(|| i.placeholder.clone())
                    .unwrap_or_else(|| i.name.clone());
                self.focus_order.push(FocusStop {
                    key: key.clone(),
                    id: i.id.clone(),
                    kind: "input",
                    label,
                });
            }
            Node::Button(b) => self.focus_order.push(FocusStop {
                key: key.clone(),
                id: b.id.clone(),
                kind: "button",
                label: b.text.clone(),
            }),
            Node::Image(img) if img.alt.trim().is_empty() => {
                self.images_missing_alt.push(img.id.clone());
            }
            _ => {}
        }
        for (i, child) in node.children().iter().enumerate() {
            self.visit(child, key.child(i));
        }
    }

    pub fn checklist(&self) -> Vec<ChecklistItem> {
        let contrast = match &self.contrast {
            Some(c) if c.passes_aa() => CheckStatus::Pass,
            Some(_) => CheckStatus::Fail,
            None => CheckStatus::Pending,
        };
        let computed = |ok: bool| if ok { CheckStatus::Pass } else { CheckStatus::Fail };
        vec![
            ChecklistItem {
                label: "Adequate contrast (WCAG AA 4.5:1)",
                status: contrast,
            },
            ChecklistItem {
                label: "Logical focus order",
                status: CheckStatus::Pending,
            },
            ChecklistItem {
                label: "Responsive layout (320px, 768px, 1024px)",
                status: CheckStatus::Pending,
            },
            ChecklistItem {
                label: "Reduced motion respected",
                status: CheckStatus::Pending,
            },
            ChecklistItem {
                label: "Alternative text on images",
                status: computed(self.images_missing_alt.is_empty()),
            },
            ChecklistItem {
                label: "Form fields have labels",
                status: computed(self.inputs_missing_label.is_empty()),
            },
        ]
    }

    pub fn to_markdown(&self, generated_at: DateTime<Utc>) -> String {
        let mut md = String::new();
        // Writing into a String cannot fail
        let _ = self.write_markdown(&mut md, generated_at);
        md
    }

    fn write_markdown(&self, md: &mut String, generated_at: DateTime<Utc>) -> std::fmt::Result {
        writeln!(md, "# QA Report\n")?;
        writeln!(md, "**Generated at:** {}\n", generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;

        if let Some(c) = &self.contrast {
            writeln!(md, "## Contrast\n")?;
            writeln!(md, "- **Ratio:** {:.2}:1", c.ratio)?;
            let status = if c.passes_aaa() {
                "PASS (AAA)"
            } else if c.passes_aa() {
                "PASS (AA)"
            } else {
                "FAIL"
            };
            writeln!(md, "- **Status:** {} (AA needs {}:1)", status, WCAG_AA)?;
            writeln!(md, "- **Colors:** {} on {}\n", c.foreground, c.background)?;
        }

        writeln!(md, "## Focus order\n")?;
        if self.focus_order.is_empty() {
            writeln!(md, "_No focusable elements._")?;
        }
        for (i, stop) in self.focus_order.iter().enumerate() {
            writeln!(md, "{}. {} `{}`: {}", i + 1, stop.kind, stop.id, stop.label)?;
        }
        writeln!(md)?;

        if !self.images_missing_alt.is_empty() {
            writeln!(md, "## Images without alt text\n")?;
            for id in &self.images_missing_alt {
                writeln!(md, "- `{}`", id)?;
            }
            writeln!(md)?;
        }
        if !self.inputs_missing_label.is_empty() {
            writeln!(md, "## Inputs without label\n")?;
            for id in &self.inputs_missing_label {
                writeln!(md, "- `{}`", id)?;
            }
            writeln!(md)?;
        }

        writeln!(md, "## Checklist\n")?;
        for item in self.checklist() {
            match item.status {
                CheckStatus::Pass => writeln!(md, "- [x] {}", item.label)?,
                CheckStatus::Fail => writeln!(md, "- [ ] {} (fail)", item.label)?,
                CheckStatus::Pending => writeln!(md, "- [ ] {}", item.label)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn report(raw: serde_json::Value) -> QaReport {
        QaReport::analyze(&uiforge_dsl::validate(&raw).unwrap())
    }

    #[test]
    fn test_focus_order_follows_tree() {
        let r = report(json!({"version": "0.1", "root": {"type": "container", "children": [
            {"type": "button", "id": "top", "text": "Menu"},
            {"type": "form", "children": [
                {"type": "input", "id": "e", "placeholder": "Email"},
                {"type": "button", "id": "go", "text": "Go"}
            ]}
        ]}}));
        let ids: Vec<&str> = r.focus_order.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["top", "e", "go"]);
        assert_eq!(r.focus_order[1].label, "Email");
        assert_eq!(r.focus_order[2].key.as_str(), "root.children.1.children.1");
        assert_eq!(r.inputs_missing_label, vec!["e".to_string()]);
    }

    #[test]
    fn test_missing_alt_and_checklist() {
        let r = report(json!({"version": "0.1", "root": {"type": "card", "children": [
            {"type": "image", "id": "hero", "src": "a.png"},
            {"type": "image", "id": "logo", "src": "b.png", "alt": "Logo"}
        ]}}));
        assert_eq!(r.images_missing_alt, vec!["hero".to_string()]);
        let checklist = r.checklist();
        assert_eq!(checklist[0].status, CheckStatus::Pending);
        assert_eq!(checklist[4].status, CheckStatus::Fail);
        assert_eq!(checklist[5].status, CheckStatus::Pass);
    }

    #[test]
    fn test_markdown_export() {
        let r = report(json!({
            "version": "0.1",
            "palette": {"foreground": "#000000", "background": "#ffffff"},
            "root": {"type": "button", "id": "b", "text": "Go"}
        }));
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let md = r.to_markdown(at);
        assert!(md.starts_with("# QA Report\n"));
        assert!(md.contains("**Generated at:** 2024-05-01 12:00:00 UTC"));
        assert!(md.contains("- **Ratio:** 21.00:1"));
        assert!(md.contains("- **Status:** PASS (AAA)"));
        assert!(md.contains("1. button `b`: Go"));
        assert!(md.contains("- [x] Adequate contrast (WCAG AA 4.5:1)"));
        assert!(md.contains("- [ ] Logical focus order\n"));
    }
}
