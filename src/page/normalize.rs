use crate::page::element::RawElement;

/// Collapse runs of whitespace to one space and trim both ends.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Human-facing label of an element, normalized.
///
/// Precedence: `aria-label`, associated form label, visible text,
/// placeholder. Returns an empty string when none is present.
pub fn label_for(el: &RawElement) -> String {
    label_sources(el).into_iter().next().unwrap_or_default()
}

/// Every distinct non-empty label source of an element, normalized, in
/// the same precedence as [`label_for`].
pub fn label_sources(el: &RawElement) -> Vec<String> {
    let mut sources: Vec<String> = Vec::with_capacity(4);
    for source in [
        el.aria_label.as_deref(),
        el.label.as_deref(),
        el.text.as_deref(),
        el.placeholder.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(normalize_text)
    {
        if !source.is_empty() && !sources.contains(&source) {
            sources.push(source);
        }
    }
    sources
}

/// Slug form used by marker values: lower-case, spaces and underscores
/// become `-`, repeated dashes collapse.
pub fn slugify(raw: &str) -> String {
    let lowered: String = normalize_text(raw)
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '_' { '-' } else { c })
        .collect();

    let mut out = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches('-').to_string()
}
