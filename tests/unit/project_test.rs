use dbexport::error::ExportError;
use dbexport::options::ExportOptions;
use dbexport::project::project;
use dbexport::value::Value;

#[test]
fn preserves_length_and_order() {
    let opts = ExportOptions {
        null_text: "NULL".to_string(),
        ..Default::default()
    };
    let row = vec![
        Value::Integer(1),
        Value::NullableText(Some("a".to_string())),
        Value::NullableDouble(None),
        Value::Decimal("3.14".to_string()),
    ];

    let fields = project(&row, &opts).unwrap();
    assert_eq!(fields.len(), row.len());
    assert_eq!(fields, vec!["1", "a", "NULL", "3.14"]);
}

#[test]
fn empty_row_projects_to_empty() {
    let fields = project(&[], &ExportOptions::default()).unwrap();
    assert!(fields.is_empty());
}

#[test]
fn one_bad_cell_fails_the_whole_row() {
    let row = vec![
        Value::Integer(1),
        Value::Opaque(Some(vec![0xc3, 0x28])),
        Value::Text("never reached".to_string()),
    ];
    let result = project(&row, &ExportOptions::default());
    assert!(matches!(result, Err(ExportError::Normalization { .. })));
}
