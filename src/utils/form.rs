use crate::domain::model::{Form, FormMethod};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Attribute run of an opening tag; quoted values may contain `>`.
const TAG_ATTRIBUTES: &str = r#"((?:[^>"']|"[^"]*"|'[^']*')*)"#;

fn tag_pattern(template: &str) -> Regex {
    Regex::new(&template.replace("{attrs}", TAG_ATTRIBUTES)).expect("tag pattern")
}

static FORM_TAG: LazyLock<Regex> =
    LazyLock::new(|| tag_pattern(r"(?is)<form\b{attrs}>(.*?)</form>"));
static INPUT_TAG: LazyLock<Regex> = LazyLock::new(|| tag_pattern(r"(?is)<input\b{attrs}>"));
static TEXTAREA_TAG: LazyLock<Regex> =
    LazyLock::new(|| tag_pattern(r"(?is)<textarea\b{attrs}>(.*?)</textarea>"));
static SELECT_TAG: LazyLock<Regex> =
    LazyLock::new(|| tag_pattern(r"(?is)<select\b{attrs}>(.*?)</select>"));
static OPTION_TAG: LazyLock<Regex> =
    LazyLock::new(|| tag_pattern(r"(?is)<option\b{attrs}>([^<]*)"));
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)([a-z_:][-a-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("attribute pattern")
});

fn attributes(raw: &str) -> HashMap<String, String> {
    ATTRIBUTE
        .captures_iter(raw)
        .map(|caps| {
            let name = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| decode_entities(m.as_str()))
                .unwrap_or_default();
            (name, value)
        })
        .collect()
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn field_name(attrs: &HashMap<String, String>) -> Option<String> {
    attrs
        .get("name")
        .filter(|name| !name.is_empty() && !attrs.contains_key("disabled"))
        .cloned()
}

/// Values a `<select>` submits: every selected option of a multi-select,
/// otherwise the last selected option or the first one.
fn select_values(attrs: &HashMap<String, String>, options: &str) -> Vec<String> {
    let options: Vec<(bool, String)> = OPTION_TAG
        .captures_iter(options)
        .filter_map(|option| {
            let attrs = attributes(&option[1]);
            if attrs.contains_key("disabled") {
                return None;
            }
            let value = attrs
                .get("value")
                .cloned()
                .unwrap_or_else(|| decode_entities(option[2].trim()));
            Some((attrs.contains_key("selected"), value))
        })
        .collect();

    let selected = options
        .iter()
        .filter(|(selected, _)| *selected)
        .map(|(_, value)| value.clone());
    if attrs.contains_key("multiple") {
        return selected.collect();
    }
    selected
        .last()
        .or_else(|| options.first().map(|(_, value)| value.clone()))
        .into_iter()
        .collect()
}

/// Extracts the first `<form>` of an HTML fragment with its submittable
/// `<input>`, `<textarea>` and `<select>` fields, in document order.
pub fn parse_form(html: &str) -> Option<Form> {
    let caps = FORM_TAG.captures(html)?;
    let form_attrs = attributes(&caps[1]);
    let body = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    let body_start = caps.get(2).map(|m| m.start()).unwrap_or_default();

    let method = match form_attrs.get("method").map(|m| m.to_ascii_lowercase()) {
        Some(m) if m == "get" => FormMethod::Get,
        _ => FormMethod::Post,
    };

    let mut positioned: Vec<(usize, String, String)> = Vec::new();

    for input in INPUT_TAG.captures_iter(body) {
        let attrs = attributes(&input[1]);
        let Some(name) = field_name(&attrs) else {
            continue;
        };
        let kind = attrs
            .get("type")
            .map(|t| t.to_ascii_lowercase())
            .unwrap_or_else(|| "text".to_string());
        match kind.as_str() {
            "submit" | "button" | "reset" | "image" | "file" => continue,
            "checkbox" | "radio" if !attrs.contains_key("checked") => continue,
            _ => {}
        }
        let value = attrs.get("value").cloned().unwrap_or_else(|| {
            if kind == "checkbox" || kind == "radio" {
                "on".to_string()
            } else {
                String::new()
            }
        });
        let offset = input.get(0).map(|m| m.start()).unwrap_or_default();
        positioned.push((body_start + offset, name, value));
    }

    for textarea in TEXTAREA_TAG.captures_iter(body) {
        let attrs = attributes(&textarea[1]);
        let Some(name) = field_name(&attrs) else {
            continue;
        };
        let offset = textarea.get(0).map(|m| m.start()).unwrap_or_default();
        positioned.push((body_start + offset, name, decode_entities(&textarea[2])));
    }

    for select in SELECT_TAG.captures_iter(body) {
        let attrs = attributes(&select[1]);
        let Some(name) = field_name(&attrs) else {
            continue;
        };
        let offset = select.get(0).map(|m| m.start()).unwrap_or_default();
        for value in select_values(&attrs, &select[2]) {
            positioned.push((body_start + offset, name.clone(), value));
        }
    }

    // Stable, so a multi-select keeps its option order.
    positioned.sort_by_key(|(position, _, _)| *position);

    Some(Form {
        action: form_attrs.get("action").cloned().unwrap_or_default(),
        method,
        fields: positioned
            .into_iter()
            .map(|(_, name, value)| (name, value))
            .collect(),
    })
}
