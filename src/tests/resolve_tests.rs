use indexmap::IndexMap;

use crate::domain::FieldKind;
use crate::resolve::{ResolveError, downstream_of, direct_dependents, expand, join_url, placeholders};

use super::support::{field, with_source};

fn params(entries: &[(&str, &str)]) -> IndexMap<String, String> {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[test]
fn placeholders_are_ordered_and_deduped() {
    assert_eq!(
        placeholders("/areas/{state}/{city}/{state}"),
        vec!["state".to_string(), "city".to_string()]
    );
    assert!(placeholders("/states").is_empty());
}

#[test]
fn expand_substitutes_and_encodes() {
    let url = expand("/cities/{state}", &params(&[("state", "Tamil Nadu")])).unwrap();
    assert_eq!(url, "/cities/Tamil%20Nadu");

    let url = expand("/areas/{city}", &params(&[("city", "a/b")])).unwrap();
    assert_eq!(url, "/areas/a%2Fb");
}

#[test]
fn expand_rejects_missing_parameter() {
    let err = expand("/cities/{state}", &params(&[])).unwrap_err();
    assert_eq!(err, ResolveError::MissingParam("state".to_string()));

    // An empty value is as good as missing.
    let err = expand("/cities/{state}", &params(&[("state", "")])).unwrap_err();
    assert_eq!(err, ResolveError::MissingParam("state".to_string()));
}

#[test]
fn join_url_passes_absolute_sources_through() {
    assert_eq!(
        join_url("https://api.example.com/api/", "https://geo.example.com/states"),
        "https://geo.example.com/states"
    );
}

#[test]
fn join_url_joins_relative_sources() {
    assert_eq!(
        join_url("https://api.example.com/api/", "v1/geo/states"),
        "https://api.example.com/api/v1/geo/states"
    );
    assert_eq!(
        join_url("https://api.example.com/api", "/v1/geo/states"),
        "https://api.example.com/api/v1/geo/states"
    );
}

#[test]
fn join_url_deduplicates_shared_prefix() {
    assert_eq!(
        join_url("https://api.example.com/api", "/api/v1/geo/states"),
        "https://api.example.com/api/v1/geo/states"
    );
}

#[test]
fn dependency_graph_follows_placeholders() {
    let fields = vec![
        with_source(field("state", FieldKind::Dropdown), "/states"),
        with_source(field("city", FieldKind::Dropdown), "/cities/{state}"),
        with_source(field("area", FieldKind::Dropdown), "/areas/{city}"),
    ];

    assert_eq!(direct_dependents(&fields, "state"), vec!["city".to_string()]);
    assert_eq!(direct_dependents(&fields, "city"), vec!["area".to_string()]);
    assert_eq!(
        downstream_of(&fields, "state"),
        vec!["city".to_string(), "area".to_string()]
    );
    assert_eq!(downstream_of(&fields, "area"), Vec::<String>::new());
}
