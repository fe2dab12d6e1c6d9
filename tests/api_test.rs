use idea_core::{parse, parse_final, parse_with_imports, ImportSources};
use serde_json::json;

#[test]
fn test_enum_compiles_to_key_value_map() {
    let config = parse(r#"enum Status { ACTIVE "Active" INACTIVE "Inactive" }"#).unwrap();
    assert_eq!(
        config.to_value(),
        json!({ "enum": { "Status": { "ACTIVE": "Active", "INACTIVE": "Inactive" } } })
    );
}

#[test]
fn test_model_with_id_column() {
    let config = parse("model User { id String @id }").unwrap();
    assert_eq!(
        config.to_value(),
        json!({
            "model": {
                "User": {
                    "name": "User",
                    "mutable": true,
                    "attributes": {},
                    "columns": [
                        { "type": "String", "name": "id", "required": true, "multiple": false, "attributes": { "id": true } }
                    ]
                }
            }
        })
    );
}

#[test]
fn test_prop_reference_kept_by_parse_and_inlined_by_final() {
    let source = r#"
        prop Text { type "text" }
        model User { name String @field.input(Text) }
    "#;

    let parsed = parse(source).unwrap();
    assert_eq!(parsed.props["Text"], json!({ "type": "text" }));
    assert_eq!(
        parsed.models["User"]["columns"][0]["attributes"]["field.input"],
        json!(["${Text}"])
    );

    let finalized = parse_final(source).unwrap();
    let value = finalized.to_value();
    assert!(value.get("prop").is_none());
    assert_eq!(
        value["model"]["User"]["columns"][0]["attributes"]["field.input"],
        json!([{ "type": "text" }])
    );
}

#[test]
fn test_mergeable_models_from_two_sources() {
    let sources: ImportSources = [("./base.idea", "model User { id String @id }")]
        .into_iter()
        .collect();
    let config = parse_with_imports(
        r#"
        use "./base.idea"
        model User { email String @required }
        "#,
        &sources,
    )
    .unwrap();

    let columns = config.models["User"]["columns"].as_array().cloned().unwrap_or_default();
    let names: Vec<&str> = columns.iter().filter_map(|c| c["name"].as_str()).collect();
    assert_eq!(names, vec!["id", "email"]);
    assert_eq!(columns[0]["attributes"], json!({ "id": true }));
    assert_eq!(columns[1]["attributes"], json!({ "required": true }));
    assert_eq!(config.imports, vec!["./base.idea"]);
}

#[test]
fn test_parse_lists_use_paths_without_loading_them() {
    let config = parse(r#"use "./a.idea" enum A { X "x" }"#).unwrap();
    assert_eq!(config.imports, vec!["./a.idea"]);
    assert_eq!(
        config.to_value(),
        json!({ "use": ["./a.idea"], "enum": { "A": { "X": "x" } } })
    );

    let finalized = parse_final(r#"use "./a.idea" enum A { X "x" }"#).unwrap();
    assert!(finalized.to_value().get("use").is_none());
    assert_eq!(finalized.enums["A"], json!({ "X": "x" }));
}

#[test]
fn test_same_source_declarations_merge_too() {
    let config = parse(
        r#"
        model User @label("User") { id String @id }
        model User @icon("user") { email String }
        "#,
    )
    .unwrap();
    let user = &config.models["User"];
    assert_eq!(user["attributes"], json!({ "label": ["User"], "icon": ["user"] }));
    assert_eq!(user["columns"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_final_declaration_replaces_mergeable_one() {
    let config = parse(
        r#"
        enum Role { ADMIN "Admin" USER "User" }
        enum Role! { GUEST "Guest" }
        "#,
    )
    .unwrap();
    assert_eq!(config.enums["Role"], json!({ "GUEST": "Guest" }));

    let config = parse(
        r#"
        enum Role! { GUEST "Guest" }
        enum Role { ADMIN "Admin" }
        "#,
    )
    .unwrap();
    assert_eq!(config.enums["Role"], json!({ "GUEST": "Guest" }));
}

#[test]
fn test_type_reference_inlines_resolved_type() {
    let source = r#"
        prop Street { label "Street" }
        type Address { street String @field.input(Street) }
        model User { address Address @fieldset(Address) }
    "#;
    let config = parse_final(source).unwrap();
    let fieldset = &config.models["User"]["columns"][0]["attributes"]["fieldset"][0];
    assert_eq!(fieldset["name"], "Address");
    assert_eq!(
        fieldset["columns"][0]["attributes"]["field.input"],
        json!([{ "label": "Street" }])
    );
    assert!(config.types.contains_key("Address"));
}

#[test]
fn test_enum_reference_in_attribute() {
    let source = r#"
        enum Roles { ADMIN "Admin" }
        model User { role String @field.select(Roles) }
    "#;
    let config = parse_final(source).unwrap();
    assert_eq!(
        config.models["User"]["columns"][0]["attributes"]["field.select"],
        json!([{ "ADMIN": "Admin" }])
    );
}

#[test]
fn test_plugin_block_is_plain_object() {
    let config = parse(
        r#"
        plugin "./make-types" {
            ts true
            output "./build/types.ts"
            targets [ "node" "browser" ]
            options { strict true depth 2 ratio 0.5 nothing null }
        }
        "#,
    )
    .unwrap();
    assert_eq!(
        config.plugins["./make-types"],
        json!({
            "ts": true,
            "output": "./build/types.ts",
            "targets": ["node", "browser"],
            "options": { "strict": true, "depth": 2, "ratio": 0.5, "nothing": null }
        })
    );
}

#[test]
fn test_declaration_order_is_preserved() {
    let config = parse(
        r#"
        model Zebra { id String }
        model Apple { id String }
        model Mango { id String }
        "#,
    )
    .unwrap();
    let names: Vec<&String> = config.models.keys().collect();
    assert_eq!(names, vec!["Zebra", "Apple", "Mango"]);
}

#[test]
fn test_dollar_brace_string_is_not_a_reference() {
    let source = r#"
        plugin "./make-env" { output "${OUT}" name "Out" }
        enum Vars { OUT "${OUT}" }
    "#;

    let parsed = parse(source).unwrap();
    assert_eq!(parsed.plugins["./make-env"]["output"], "$${OUT}");

    let finalized = parse_final(source).unwrap();
    assert_eq!(
        finalized.plugins["./make-env"],
        json!({ "output": "${OUT}", "name": "Out" })
    );
    assert_eq!(finalized.enums["Vars"], json!({ "OUT": "${OUT}" }));
}
