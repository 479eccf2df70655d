use serde_json::json;

use crate::domain::{FieldKind, parse_section, parse_sections};

#[test]
fn parses_full_section() {
    let raw = json!({
        "section_id": "owner_details",
        "title": "Owner Details",
        "description": "Tell us about the owner",
        "button_text": "Proceed",
        "messages": {
            "required": "Yeh field zaroori hai"
        },
        "fields": [
            {"key": "name", "type": "text", "label": "Owner Name", "required": true},
            {"key": "state", "type": "dropdown", "required": true, "options_source": "/states"},
            {"key": "city", "type": "dropdown", "required": true, "options_source": "/cities/{state}"},
            {"key": "cuisine", "type": "dropdown", "options": ["North Indian", {"id": "2", "name": "South Indian"}]},
            {"key": "dob", "type": "date"},
            {"key": "mobile", "type": "phone", "verify_otp": true},
            {"key": "veg_only", "type": "toggle", "default": false},
            {"key": "pan_card", "type": "file", "required": true, "file_types": [".PDF", "jpg"], "max_size_mb": 2}
        ]
    });

    let section = parse_section(&raw).expect("section parses");
    assert_eq!(section.id, "owner_details");
    assert_eq!(section.title, "Owner Details");
    assert_eq!(section.button_text.as_deref(), Some("Proceed"));
    assert_eq!(section.messages.required(), "Yeh field zaroori hai");
    assert_eq!(section.fields.len(), 8);

    let state = section.field("state").unwrap();
    assert_eq!(state.kind, FieldKind::Dropdown);
    assert_eq!(state.options_source.as_deref(), Some("/states"));
    assert!(state.options.is_empty());

    let cuisine = section.field("cuisine").unwrap();
    assert_eq!(cuisine.options.len(), 2);
    assert_eq!(cuisine.options[0].label, "North Indian");
    assert_eq!(cuisine.options[1].id.as_deref(), Some("2"));
    assert_eq!(cuisine.options[1].label, "South Indian");

    let mobile = section.field("mobile").unwrap();
    assert!(mobile.verify_otp);

    let pan = section.field("pan_card").unwrap();
    assert_eq!(pan.file_types, vec!["pdf".to_string(), "jpg".to_string()]);
    assert_eq!(pan.max_size_mb, 2);
}

#[test]
fn field_defaults_apply() {
    let raw = json!({
        "section_id": "docs",
        "fields": [{"key": "fssai", "type": "file"}]
    });
    let section = parse_section(&raw).expect("section parses");
    let field = section.field("fssai").unwrap();
    assert_eq!(field.file_types, vec!["jpg", "jpeg", "png", "pdf"]);
    assert_eq!(field.max_size_mb, 5);
    assert!(!field.required);
}

#[test]
fn rejects_unknown_field_type() {
    let raw = json!({
        "section_id": "bank",
        "fields": [{"key": "ifsc", "type": "barcode"}]
    });
    let err = parse_section(&raw).expect_err("unknown type is a parse error");
    assert!(format!("{err:#}").contains("unknown type 'barcode'"));
}

#[test]
fn rejects_duplicate_keys() {
    let raw = json!({
        "section_id": "bank",
        "fields": [
            {"key": "account", "type": "text"},
            {"key": "account", "type": "text"}
        ]
    });
    let err = parse_section(&raw).expect_err("duplicate key is a parse error");
    assert!(format!("{err:#}").contains("duplicate field key 'account'"));
}

#[test]
fn rejects_field_without_key() {
    let raw = json!({
        "section_id": "bank",
        "fields": [{"type": "text"}]
    });
    assert!(parse_section(&raw).is_err());
}

#[test]
fn parses_section_list_with_index_context() {
    let raw = json!([
        {"section_id": "bank", "fields": []},
        {"fields": []}
    ]);
    let err = parse_sections(&raw).expect_err("second section is invalid");
    assert!(format!("{err:#}").contains("index 1"));
}

#[test]
fn prefill_wins_over_default() {
    let raw = json!({
        "section_id": "owner",
        "fields": [{"key": "name", "type": "text", "default": "A", "value": "B"}]
    });
    let section = parse_section(&raw).unwrap();
    let field = section.field("name").unwrap();
    assert_eq!(field.default, Some(json!("A")));
    assert_eq!(field.prefill, Some(json!("B")));
}
