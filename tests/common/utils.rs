use locatorless::action::config::EngineConfig;
use locatorless::action::handler::Engine;
use locatorless::action::retry::DelayPolicy;
use locatorless::component::registry::KindRegistry;
use locatorless::page::element::{NestedItem, RawElement};

use crate::common::fake_page::FakePage;

/// Timings short enough for unit tests; no pause between retries.
pub fn fast_config() -> EngineConfig {
    EngineConfig {
        precondition_timeout_ms: 60,
        poll_interval_ms: 5,
        retry_attempts: 3,
        retry_delay: DelayPolicy::none(),
        verify_settle_ms: 30,
    }
}

pub fn engine(page: FakePage) -> Engine<FakePage> {
    Engine::new(page, KindRegistry::builtin(), fast_config())
}

// ============================================================================
// Element builders
// ============================================================================

pub fn button(handle: &str, label: &str) -> RawElement {
    let mut el = RawElement::new(handle, "button");
    el.classes = vec!["ant-btn".into(), "ant-btn-default".into()];
    el.text = Some(label.to_string());
    el
}

pub fn primary_button(handle: &str, label: &str) -> RawElement {
    let mut el = button(handle, label);
    el.classes = vec!["ant-btn".into(), "ant-btn-primary".into()];
    el
}

pub fn switch(handle: &str, label: &str, on: bool) -> RawElement {
    let mut el = RawElement::new(handle, "button");
    el.role = Some("switch".into());
    el.classes = vec!["ant-switch".into()];
    if on {
        el.classes.push("ant-switch-checked".into());
    }
    el.aria.insert("checked".into(), on.to_string());
    el.aria_label = Some(label.to_string());
    el
}

pub fn checkbox(handle: &str, label: &str, checked: bool) -> RawElement {
    let mut el = RawElement::new(handle, "label");
    el.classes = vec!["ant-checkbox-wrapper".into()];
    if checked {
        el.classes.push("ant-checkbox-wrapper-checked".into());
    }
    el.aria.insert("checked".into(), checked.to_string());
    el.text = Some(label.to_string());
    el
}

pub fn radio(handle: &str, label: &str, checked: bool) -> RawElement {
    let mut el = RawElement::new(handle, "label");
    el.classes = vec!["ant-radio-wrapper".into()];
    el.aria.insert("checked".into(), checked.to_string());
    el.text = Some(label.to_string());
    el
}

pub fn text_input(handle: &str, label: &str) -> RawElement {
    let mut el = RawElement::new(handle, "input");
    el.classes = vec!["ant-input".into()];
    el.attributes.insert("type".into(), "text".into());
    el.label = Some(label.to_string());
    el
}

pub fn dropdown(handle: &str, label: &str) -> RawElement {
    let mut el = RawElement::new(handle, "div");
    el.classes = vec!["ant-select".into(), "ant-select-single".into()];
    el.aria.insert("expanded".into(), "false".into());
    el.label = Some(label.to_string());
    el
}

pub fn multi_dropdown(handle: &str, label: &str) -> RawElement {
    let mut el = dropdown(handle, label);
    el.classes = vec!["ant-select".into(), "ant-select-multiple".into()];
    el
}

pub fn option(handle: &str, text: &str) -> RawElement {
    let mut el = RawElement::new(handle, "div");
    el.role = Some("option".into());
    el.classes = vec!["ant-select-item".into(), "ant-select-item-option".into()];
    el.text = Some(text.to_string());
    el
}

fn page_classes(n: u32, active: bool) -> Vec<String> {
    let mut classes = vec!["ant-pagination-item".to_string(), format!("ant-pagination-item-{n}")];
    if active {
        classes.push("ant-pagination-item-active".into());
    }
    classes
}

/// A pagination container followed by its page items.
pub fn pagination(handle: &str, pages: u32, active: u32) -> Vec<RawElement> {
    let mut container = RawElement::new(handle, "ul");
    container.classes = vec!["ant-pagination".into()];
    container.items = (1..=pages)
        .map(|n| NestedItem {
            classes: page_classes(n, n == active),
            text: Some(n.to_string()),
            ..NestedItem::default()
        })
        .collect();

    let mut elements = vec![container];
    for n in 1..=pages {
        let mut item = RawElement::new(format!("{handle}-p{n}"), "li");
        item.classes = page_classes(n, n == active);
        item.text = Some(n.to_string());
        elements.push(item);
    }
    elements
}

/// An Ant Design table with one header per column and one row per entry.
pub fn table(handle: &str, headers: &[&str], rows: &[&[&str]]) -> RawElement {
    let mut el = RawElement::new(handle, "div");
    el.classes = vec!["ant-table-wrapper".into()];
    el.items = headers
        .iter()
        .map(|h| NestedItem {
            classes: vec!["ant-table-cell".into()],
            role: Some("columnheader".into()),
            text: Some(h.to_string()),
            ..NestedItem::default()
        })
        .collect();
    if rows.is_empty() {
        el.items.push(NestedItem {
            classes: vec!["ant-table-placeholder".into()],
            text: Some("No data".into()),
            ..NestedItem::default()
        });
    }
    el.items.extend(rows.iter().map(|cells| NestedItem {
        classes: vec!["ant-table-row".into()],
        cells: cells.iter().map(|c| c.to_string()).collect(),
        ..NestedItem::default()
    }));
    el
}

pub fn upload(handle: &str, label: &str) -> RawElement {
    let mut el = RawElement::new(handle, "span");
    el.classes = vec!["ant-upload-wrapper".into()];
    el.text = Some(label.to_string());
    el
}

// ============================================================================
// Modifiers
// ============================================================================

pub fn marked(mut el: RawElement, marker: &str) -> RawElement {
    el.marker = Some(marker.to_string());
    el
}

pub fn grouped(mut el: RawElement, group: &str) -> RawElement {
    el.group = Some(group.to_string());
    el
}

pub fn hidden(mut el: RawElement) -> RawElement {
    el.visible = false;
    el
}

pub fn disabled(mut el: RawElement) -> RawElement {
    el.attributes.insert("disabled".into(), String::new());
    el
}

pub fn loading(mut el: RawElement) -> RawElement {
    el.classes.push("ant-btn-loading".into());
    el
}
