use std::sync::LazyLock;

use indexmap::IndexMap;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use regex::Regex;
use thiserror::Error;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("placeholder pattern is valid"));

// Reserved characters that must not leak into a path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'&')
    .add(b'/')
    .add(b'%')
    .add(b'+');

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no value for template parameter '{0}'")]
    MissingParam(String),
}

/// Ordered, de-duplicated `{param}` names in an options-source template.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    for capture in PLACEHOLDER.captures_iter(template) {
        let name = capture[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Substitute `{param}` tokens with percent-encoded values. The first
/// parameter with no value aborts expansion; dependent dropdowns use that to
/// refuse opening before their parent is set.
pub fn expand(template: &str, params: &IndexMap<String, String>) -> Result<String, ResolveError> {
    let mut expanded = template.to_string();
    for name in placeholders(template) {
        let value = params
            .get(&name)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ResolveError::MissingParam(name.clone()))?;
        let encoded = utf8_percent_encode(value, SEGMENT).to_string();
        expanded = expanded.replace(&format!("{{{name}}}"), &encoded);
    }
    Ok(expanded)
}

/// Join a relative options source onto the API base URL. Absolute sources
/// pass through; a leading source segment already at the tail of the base
/// path is not duplicated.
pub fn join_url(base: &str, source: &str) -> String {
    if source.starts_with("http://") || source.starts_with("https://") {
        return source.to_string();
    }
    let base = base.trim_end_matches('/');
    let source = source.trim_start_matches('/');
    if let Some(first) = source.split('/').next()
        && !first.is_empty()
        && base.ends_with(&format!("/{first}"))
    {
        let rest = &source[first.len()..];
        return format!("{base}{rest}");
    }
    format!("{base}/{source}")
}
