use crate::component::kind::{Interaction, KindDescriptor, KindState, ToggleModel};
use crate::component::table::{is_data_row, table_headers};
use crate::page::element::{NestedItem, RawElement};
use crate::page::normalize::normalize_text;

// ============================================================================
// Built-in capability descriptors
//
// Classification relies on role attributes, Ant Design class tokens and the
// nesting shape reported in `RawElement::items`. Registration order matters:
// the first descriptor whose classifier claims an element wins.
// ============================================================================

pub const VARIANT_ATTRIBUTE: &str = "data-variant";

const VALUE_PROBE: &str = r#"
const el = arguments[0];
const field = el.matches('input, textarea, select') ? el : el.querySelector('input, textarea, select');
return { value: field ? field.value : null };
"#;

const CHECKED_PROBE: &str = r#"
const el = arguments[0];
const field = el.matches('input') ? el : el.querySelector('input[type=checkbox], input[type=radio]');
return field ? { checked: field.checked, indeterminate: !!field.indeterminate } : {};
"#;

const MENU_LEVEL_PROBE: &str = r#"
const el = arguments[0];
let level = 1;
for (let p = el.parentElement; p; p = p.parentElement) {
  if (p.matches('li.ant-menu-submenu')) level += 1;
}
return { level };
"#;

pub fn builtin() -> Vec<KindDescriptor> {
    vec![
        KindDescriptor {
            name: "pagination",
            classify: is_pagination,
            extract: pagination_state,
            variant_attribute: VARIANT_ATTRIBUTE,
            live_probe: None,
            interaction: Interaction {
                paged: true,
                ..Interaction::CLICK_ONLY
            },
            child_kind: Some("page_item"),
        },
        KindDescriptor {
            name: "page_item",
            classify: is_page_item,
            extract: page_item_state,
            variant_attribute: VARIANT_ATTRIBUTE,
            live_probe: None,
            interaction: Interaction::CLICK_ONLY,
            child_kind: None,
        },
        KindDescriptor {
            name: "table",
            classify: is_table,
            extract: table_state,
            variant_attribute: VARIANT_ATTRIBUTE,
            live_probe: None,
            interaction: Interaction::CLICK_ONLY,
            child_kind: None,
        },
        KindDescriptor {
            name: "upload",
            classify: is_upload,
            extract: upload_state,
            variant_attribute: VARIANT_ATTRIBUTE,
            live_probe: None,
            interaction: Interaction {
                upload: true,
                ..Interaction::CLICK_ONLY
            },
            child_kind: None,
        },
        KindDescriptor {
            name: "date_picker",
            classify: is_date_picker,
            extract: date_picker_state,
            variant_attribute: VARIANT_ATTRIBUTE,
            live_probe: Some(VALUE_PROBE),
            interaction: Interaction {
                text_entry: true,
                ..Interaction::CLICK_ONLY
            },
            child_kind: None,
        },
        KindDescriptor {
            name: "tree_select",
            classify: is_tree_select,
            extract: select_state,
            variant_attribute: VARIANT_ATTRIBUTE,
            live_probe: None,
            interaction: Interaction {
                selectable: true,
                ..Interaction::CLICK_ONLY
            },
            child_kind: Some("option"),
        },
        KindDescriptor {
            name: "option",
            classify: is_option,
            extract: option_state,
            variant_attribute: VARIANT_ATTRIBUTE,
            live_probe: None,
            interaction: Interaction::CLICK_ONLY,
            child_kind: None,
        },
        KindDescriptor {
            name: "dropdown",
            classify: is_dropdown,
            extract: select_state,
            variant_attribute: VARIANT_ATTRIBUTE,
            live_probe: None,
            interaction: Interaction {
                selectable: true,
                ..Interaction::CLICK_ONLY
            },
            child_kind: Some("option"),
        },
        KindDescriptor {
            name: "switch",
            classify: is_switch,
            extract: switch_state,
            variant_attribute: VARIANT_ATTRIBUTE,
            live_probe: None,
            interaction: Interaction {
                toggle: ToggleModel::Binary,
                ..Interaction::CLICK_ONLY
            },
            child_kind: None,
        },
        KindDescriptor {
            name: "checkbox",
            classify: is_checkbox,
            extract: checkbox_state,
            variant_attribute: VARIANT_ATTRIBUTE,
            live_probe: Some(CHECKED_PROBE),
            interaction: Interaction {
                toggle: ToggleModel::Binary,
                ..Interaction::CLICK_ONLY
            },
            child_kind: None,
        },
        KindDescriptor {
            name: "radio",
            classify: is_radio,
            extract: radio_state,
            variant_attribute: VARIANT_ATTRIBUTE,
            live_probe: Some(CHECKED_PROBE),
            interaction: Interaction {
                toggle: ToggleModel::SelectOnly,
                ..Interaction::CLICK_ONLY
            },
            child_kind: None,
        },
        KindDescriptor {
            name: "menu",
            classify: is_menu_item,
            extract: menu_state,
            variant_attribute: VARIANT_ATTRIBUTE,
            live_probe: Some(MENU_LEVEL_PROBE),
            interaction: Interaction::CLICK_ONLY,
            child_kind: None,
        },
        KindDescriptor {
            name: "input",
            classify: is_input,
            extract: input_state,
            variant_attribute: VARIANT_ATTRIBUTE,
            live_probe: Some(VALUE_PROBE),
            interaction: Interaction {
                text_entry: true,
                ..Interaction::CLICK_ONLY
            },
            child_kind: None,
        },
        KindDescriptor {
            name: "button",
            classify: is_button,
            extract: button_state,
            variant_attribute: VARIANT_ATTRIBUTE,
            live_probe: None,
            interaction: Interaction::CLICK_ONLY,
            child_kind: None,
        },
    ]
}

// ============================================================================
// Classifiers
// ============================================================================

fn has_role(el: &RawElement, role: &str) -> bool {
    el.role.as_deref() == Some(role)
}

fn is_input_of_type(el: &RawElement, types: &[&str]) -> bool {
    el.tag == "input" && el.input_type().is_some_and(|t| types.contains(&t))
}

fn is_pagination(el: &RawElement) -> bool {
    el.has_class("ant-pagination")
}

fn is_page_item(el: &RawElement) -> bool {
    el.has_class("ant-pagination-item")
}

fn is_table(el: &RawElement) -> bool {
    el.has_class("ant-table-wrapper")
        || el.has_class("ant-table")
        || el.tag == "table"
        || has_role(el, "grid")
        || has_role(el, "table")
}

fn is_upload(el: &RawElement) -> bool {
    el.has_class("ant-upload-wrapper")
        || el.has_class("ant-upload")
        || is_input_of_type(el, &["file"])
}

fn is_date_picker(el: &RawElement) -> bool {
    el.has_class("ant-picker")
}

fn is_tree_select(el: &RawElement) -> bool {
    el.has_class("ant-tree-select") || el.has_class("ant-select-tree-select")
}

fn is_option(el: &RawElement) -> bool {
    has_role(el, "option")
        || has_role(el, "treeitem")
        || el.has_class("ant-select-item-option")
        || el.has_class("ant-select-tree-node-content-wrapper")
        || el.has_class("ant-cascader-menu-item")
        || el.has_class("ant-dropdown-menu-item")
        || el.tag == "option"
}

fn is_dropdown(el: &RawElement) -> bool {
    el.has_class("ant-select")
        || el.has_class("ant-cascader")
        || el.has_class("ant-dropdown-trigger")
        || el.tag == "select"
        || (has_role(el, "combobox") && !el.has_class_prefix("ant-select-selection"))
}

fn is_switch(el: &RawElement) -> bool {
    el.has_class("ant-switch") || has_role(el, "switch")
}

fn is_checkbox(el: &RawElement) -> bool {
    el.has_class("ant-checkbox-wrapper")
        || el.has_class("ant-checkbox")
        || has_role(el, "checkbox")
        || is_input_of_type(el, &["checkbox"])
}

fn is_radio(el: &RawElement) -> bool {
    el.has_class("ant-radio-wrapper")
        || el.has_class("ant-radio-button-wrapper")
        || el.has_class("ant-radio")
        || has_role(el, "radio")
        || is_input_of_type(el, &["radio"])
}

fn is_menu_item(el: &RawElement) -> bool {
    el.has_class("ant-menu-item")
        || el.has_class("ant-menu-submenu")
        || has_role(el, "menuitem")
}

fn is_input(el: &RawElement) -> bool {
    if el.tag == "textarea" || el.has_class("ant-input") || el.has_class("ant-input-number") {
        return true;
    }
    if has_role(el, "textbox") || has_role(el, "searchbox") || has_role(el, "spinbutton") {
        return true;
    }
    el.tag == "input"
        && !matches!(
            el.input_type(),
            Some("checkbox" | "radio" | "file" | "submit" | "button" | "reset" | "image" | "hidden")
        )
}

fn is_button(el: &RawElement) -> bool {
    el.tag == "button"
        || el.has_class("ant-btn")
        || has_role(el, "button")
        || is_input_of_type(el, &["submit", "button", "reset"])
}

// ============================================================================
// State extractors
// ============================================================================

fn size_from(el: &RawElement, prefix: &str) -> Option<String> {
    let size = if el.has_class(&format!("{prefix}-lg")) || el.has_class(&format!("{prefix}-large")) {
        "large"
    } else if el.has_class(&format!("{prefix}-sm"))
        || el.has_class(&format!("{prefix}-small"))
        || el.has_class(&format!("{prefix}-mini"))
    {
        "small"
    } else {
        "default"
    };
    Some(size.to_string())
}

/// `aria-invalid` reads as `error`; otherwise the `{prefix}-status-*` token.
fn status_from(el: &RawElement, prefix: &str) -> Option<String> {
    if el.aria_flag("invalid") == Some(true) {
        return Some("error".to_string());
    }
    let marker = format!("{prefix}-status-");
    el.classes
        .iter()
        .find_map(|c| c.strip_prefix(marker.as_str()))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// ARIA wins over class tokens, class tokens over the live property.
fn checked_from(el: &RawElement, classes: &[&str]) -> Option<bool> {
    if let Some(flag) = el.aria_flag("checked") {
        return Some(flag);
    }
    if el.aria("checked") == Some("mixed") {
        return Some(false);
    }
    if classes.iter().any(|c| el.has_class(c)) {
        return Some(true);
    }
    if let Some(flag) = el.property_flag("checked") {
        return Some(flag);
    }
    Some(el.has_attribute("checked"))
}

fn item_texts<'a>(items: impl Iterator<Item = &'a NestedItem>) -> Vec<String> {
    items
        .filter_map(NestedItem::display_text)
        .map(normalize_text)
        .filter(|t| !t.is_empty())
        .collect()
}

/// First of `names`, as an attribute or a live property, that parses as a
/// count.
fn count_from(el: &RawElement, names: &[&str]) -> Option<u32> {
    names.iter().find_map(|name| {
        el.attribute(name)
            .map(str::to_string)
            .or_else(|| el.property_text(name))
            .and_then(|v| v.trim().parse().ok())
    })
}

/// Whether the first nested item carrying `token` is enabled.
fn item_enabled(el: &RawElement, token: &str) -> Option<bool> {
    el.items_with_class(token)
        .next()
        .map(|item| !item.has_class("ant-pagination-disabled"))
}

fn text_value(el: &RawElement) -> Option<String> {
    el.property_text("value")
        .or_else(|| el.attribute("value").map(str::to_string))
}

fn pagination_state(el: &RawElement) -> KindState {
    let pages: Vec<(u32, &NestedItem)> = el
        .items_with_class("ant-pagination-item")
        .filter_map(|item| item.display_text()?.trim().parse::<u32>().ok().map(|n| (n, item)))
        .collect();

    let current_page = pages
        .iter()
        .find(|(_, item)| item.has_class("ant-pagination-item-active"))
        .map(|(n, _)| *n);

    let total_pages = pages.iter().map(|(n, _)| *n).max();

    let variant = if el.has_class("ant-pagination-simple") {
        "simple"
    } else {
        "default"
    };

    KindState {
        current_page,
        total_pages,
        child_count: Some(pages.len() as u32),
        variant: Some(variant.to_string()),
        size: size_from(el, "ant-pagination"),
        prev_enabled: item_enabled(el, "ant-pagination-prev"),
        next_enabled: item_enabled(el, "ant-pagination-next"),
        ..KindState::default()
    }
}

fn page_item_state(el: &RawElement) -> KindState {
    KindState {
        selected: Some(el.has_class("ant-pagination-item-active")),
        ..KindState::default()
    }
}

fn table_state(el: &RawElement) -> KindState {
    let rows = el.items.iter().filter(|i| is_data_row(i)).count();
    let placeholder = el
        .items
        .iter()
        .any(|i| i.has_class("ant-table-placeholder") || i.has_class("ant-empty"));

    let headers = table_headers(el);

    let variant = if el.has_class("ant-table-bordered") {
        "bordered"
    } else {
        "default"
    };

    KindState {
        child_count: Some(rows as u32),
        entries: Some(headers),
        empty: Some(rows == 0 || placeholder),
        variant: Some(variant.to_string()),
        size: size_from(el, "ant-table"),
        ..KindState::default()
    }
}

fn upload_state(el: &RawElement) -> KindState {
    let files = item_texts(el.items_with_class("ant-upload-list-item"));

    let variant = if el.has_class("ant-upload-drag") {
        "drag"
    } else if el.has_class_prefix("ant-upload-list-picture-card") || el.has_class("ant-upload-select-picture-card") {
        "picture-card"
    } else if el.has_class_prefix("ant-upload-list-picture") {
        "picture"
    } else {
        "text"
    };

    let multiple = el.has_attribute("multiple")
        || el.classes.iter().any(|c| c.to_ascii_lowercase().contains("multiple"));

    KindState {
        child_count: Some(files.len() as u32),
        entries: Some(files),
        variant: Some(variant.to_string()),
        max_count: count_from(el, &["data-max-count", "maxCount"])
            .or_else(|| el.aria("max").and_then(|v| v.trim().parse().ok())),
        multiple: Some(multiple),
        ..KindState::default()
    }
}

fn date_picker_state(el: &RawElement) -> KindState {
    const PICKERS: [(&str, &str); 5] = [
        ("ant-picker-time", "time"),
        ("ant-picker-week", "week"),
        ("ant-picker-month", "month"),
        ("ant-picker-quarter", "quarter"),
        ("ant-picker-year", "year"),
    ];

    let variant = if el.has_class("ant-picker-range") {
        "range"
    } else {
        PICKERS
            .iter()
            .find(|(prefix, _)| el.has_class_prefix(prefix))
            .map(|(_, name)| *name)
            .unwrap_or("date")
    };

    KindState {
        value: text_value(el).filter(|v| !v.is_empty()),
        read_only: Some(el.has_attribute("readonly") || el.aria_flag("readonly") == Some(true)),
        placeholder: el.placeholder.clone(),
        expanded: Some(el.has_class("ant-picker-focused") || el.aria_flag("expanded") == Some(true)),
        status: status_from(el, "ant-picker"),
        variant: Some(variant.to_string()),
        size: size_from(el, "ant-picker"),
        ..KindState::default()
    }
}

fn select_state(el: &RawElement) -> KindState {
    let mut selected = item_texts(el.items_with_class("ant-select-selection-item"));
    if selected.is_empty() {
        if let Some(value) = text_value(el).filter(|v| !v.is_empty()) {
            selected.push(value);
        }
    }

    let variant = if el.has_class("ant-cascader") {
        "cascader"
    } else if el.has_class("ant-select-multiple") {
        "multiple"
    } else {
        "single"
    };

    let placeholder = el
        .items_with_class("ant-select-selection-placeholder")
        .find_map(NestedItem::display_text)
        .map(normalize_text)
        .or_else(|| el.placeholder.clone());

    let native = el.tag == "select";
    let multiple = el.has_class("ant-select-multiple") || (native && el.has_attribute("multiple"));
    let searchable = !native
        && (el.has_class("ant-select-show-search")
            || el.items_with_class("ant-select-selection-search").next().is_some());

    KindState {
        value: selected.first().cloned(),
        selected_values: Some(selected),
        multiple: Some(multiple),
        searchable: Some(searchable),
        expanded: Some(el.has_class("ant-select-open") || el.aria_flag("expanded") == Some(true)),
        placeholder,
        variant: Some(variant.to_string()),
        size: size_from(el, "ant-select"),
        ..KindState::default()
    }
}

fn option_state(el: &RawElement) -> KindState {
    let selected = el.aria_flag("selected").unwrap_or_else(|| {
        el.has_class("ant-select-item-option-selected")
            || el.has_class("ant-select-tree-node-selected")
            || el.has_class("ant-dropdown-menu-item-selected")
    });
    KindState {
        selected: Some(selected),
        ..KindState::default()
    }
}

fn switch_state(el: &RawElement) -> KindState {
    let size = if el.has_class("ant-switch-small") { "small" } else { "default" };
    KindState {
        checked: checked_from(el, &["ant-switch-checked"]),
        size: Some(size.to_string()),
        ..KindState::default()
    }
}

fn checkbox_state(el: &RawElement) -> KindState {
    let indeterminate = el.has_class("ant-checkbox-indeterminate")
        || el.aria("checked") == Some("mixed")
        || el.property_flag("indeterminate") == Some(true);

    KindState {
        checked: checked_from(el, &["ant-checkbox-checked", "ant-checkbox-wrapper-checked"]),
        indeterminate: Some(indeterminate),
        value: el.attribute("value").map(str::to_string),
        ..KindState::default()
    }
}

fn radio_state(el: &RawElement) -> KindState {
    let variant = if el.has_class("ant-radio-button-wrapper") { "button" } else { "default" };
    KindState {
        checked: checked_from(
            el,
            &[
                "ant-radio-checked",
                "ant-radio-wrapper-checked",
                "ant-radio-button-wrapper-checked",
            ],
        ),
        value: el.attribute("value").map(str::to_string),
        variant: Some(variant.to_string()),
        ..KindState::default()
    }
}

fn menu_state(el: &RawElement) -> KindState {
    KindState {
        selected: Some(el.has_class("ant-menu-item-selected") || el.aria_flag("selected") == Some(true)),
        expanded: Some(el.has_class("ant-menu-submenu-open") || el.aria_flag("expanded") == Some(true)),
        child_count: Some(el.items.len() as u32),
        level: el
            .aria("level")
            .and_then(|v| v.trim().parse().ok())
            .or_else(|| count_from(el, &["data-level", "level"]))
            .or(Some(1)),
        ..KindState::default()
    }
}

fn input_state(el: &RawElement) -> KindState {
    let variant = if el.tag == "textarea" {
        "textarea".to_string()
    } else {
        el.input_type().unwrap_or("text").to_string()
    };

    KindState {
        value: text_value(el),
        read_only: Some(el.has_attribute("readonly") || el.aria_flag("readonly") == Some(true)),
        required: Some(
            el.has_attribute("required")
                || el.aria_flag("required") == Some(true)
                || el.has_class("ant-input-required"),
        ),
        placeholder: el.placeholder.clone(),
        status: status_from(el, "ant-input"),
        variant: Some(variant),
        size: size_from(el, "ant-input"),
        ..KindState::default()
    }
}

fn button_state(el: &RawElement) -> KindState {
    const VARIANTS: [&str; 5] = ["primary", "dashed", "text", "link", "default"];

    let variant = if el.has_class("ant-btn-dangerous") {
        "danger".to_string()
    } else {
        VARIANTS
            .iter()
            .find(|v| el.has_class(&format!("ant-btn-{v}")))
            .map(|v| v.to_string())
            .unwrap_or_else(|| "default".to_string())
    };

    let shape = if el.has_class("ant-btn-circle") {
        "circle"
    } else if el.has_class("ant-btn-round") {
        "round"
    } else {
        "default"
    };
    let has_text = el.text.as_deref().is_some_and(|t| !t.trim().is_empty());
    let icon_only = el.has_class("ant-btn-icon-only")
        || (!has_text && el.items.iter().any(|i| i.has_class("anticon")));

    KindState {
        variant: Some(variant),
        size: size_from(el, "ant-btn"),
        shape: Some(shape.to_string()),
        icon_only: Some(icon_only),
        ..KindState::default()
    }
}
