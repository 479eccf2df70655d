use anyhow::{Context, Result, bail};
use indexmap::IndexMap;
use serde_json::Value;

use super::schema::{
    Choice, DEFAULT_MAX_SIZE_MB, FieldDescriptor, FieldKind, FormSection, SectionMessages,
};

/// Parse the `sections` array of an onboarding payload.
pub fn parse_sections(value: &Value) -> Result<Vec<FormSection>> {
    let items = value
        .as_array()
        .context("sections payload is not an array")?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            parse_section(item).with_context(|| format!("section at index {index}"))
        })
        .collect()
}

/// Parse one section object into a `FormSection`, validating every field
/// descriptor up front so rendering never meets an unknown field type.
pub fn parse_section(value: &Value) -> Result<FormSection> {
    let obj = value.as_object().context("section is not an object")?;

    let id = obj
        .get("section_id")
        .or_else(|| obj.get("id"))
        .and_then(Value::as_str)
        .context("section is missing 'section_id'")?
        .to_string();
    let title = obj
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(&id)
        .to_string();
    let description = obj
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);
    let button_text = obj
        .get("button_text")
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut messages = IndexMap::new();
    if let Some(map) = obj.get("messages").and_then(Value::as_object) {
        for (key, entry) in map {
            if let Some(text) = entry.as_str() {
                messages.insert(key.clone(), text.to_string());
            }
        }
    }

    let mut fields = Vec::new();
    if let Some(items) = obj.get("fields").and_then(Value::as_array) {
        for (index, item) in items.iter().enumerate() {
            let field = parse_field(item)
                .with_context(|| format!("field at index {index} in section '{id}'"))?;
            fields.push(field);
        }
    }

    ensure_unique_keys(&fields)?;

    Ok(FormSection {
        id,
        title,
        description,
        button_text,
        messages: SectionMessages::from_entries(messages),
        fields,
    })
}

fn parse_field(value: &Value) -> Result<FieldDescriptor> {
    let obj = value.as_object().context("field is not an object")?;

    let key = obj
        .get("key")
        .and_then(Value::as_str)
        .context("field is missing 'key'")?
        .to_string();
    let tag = obj
        .get("type")
        .and_then(Value::as_str)
        .with_context(|| format!("field '{key}' is missing 'type'"))?;
    let Some(kind) = FieldKind::from_tag(tag) else {
        bail!("field '{key}' has unknown type '{tag}'");
    };

    let mut field = FieldDescriptor::new(key, kind);
    if let Some(label) = obj.get("label").and_then(Value::as_str) {
        field.label = label.to_string();
    }
    field.required = obj
        .get("required")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    field.default = obj.get("default").filter(|v| !v.is_null()).cloned();
    field.prefill = obj.get("value").filter(|v| !v.is_null()).cloned();
    field.verify_otp = obj
        .get("verify_otp")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if let Some(items) = obj.get("options").and_then(Value::as_array) {
        field.options = items.iter().filter_map(Choice::from_value).collect();
    }
    field.options_source = obj
        .get("options_source")
        .and_then(Value::as_str)
        .map(str::to_string);

    if let Some(items) = obj.get("file_types").and_then(Value::as_array) {
        let types: Vec<String> = items
            .iter()
            .filter_map(Value::as_str)
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        if !types.is_empty() {
            field.file_types = types;
        }
    }
    field.max_size_mb = obj
        .get("max_size_mb")
        .and_then(Value::as_u64)
        .unwrap_or(DEFAULT_MAX_SIZE_MB);

    Ok(field)
}

fn ensure_unique_keys(fields: &[FieldDescriptor]) -> Result<()> {
    let mut seen = IndexMap::new();
    for field in fields {
        if seen.insert(field.key.as_str(), ()).is_some() {
            bail!("duplicate field key '{}'", field.key);
        }
    }
    Ok(())
}
