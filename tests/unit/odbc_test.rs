use dbexport::backend::odbc::{canonical_decimal, column_kind, connection_string};
use dbexport::config::ConnectionConfig;
use dbexport::value::ColumnKind;
use odbc_api::{DataType, Nullability};
use secrecy::SecretString;

fn make_connection(connect: &str) -> ConnectionConfig {
    ConnectionConfig {
        connect: connect.to_string(),
        user: None,
        password: None,
        login_timeout_secs: 30,
        batch_size: 1000,
        max_text_len: 4000,
    }
}

#[test]
fn integer_types_map_to_integer_kinds() {
    for dt in [DataType::Integer, DataType::SmallInt, DataType::BigInt, DataType::TinyInt] {
        assert_eq!(column_kind(&dt, Nullability::Nullable), ColumnKind::NullableInteger);
        assert_eq!(column_kind(&dt, Nullability::NoNulls), ColumnKind::Integer);
    }
}

#[test]
fn unknown_nullability_is_treated_as_nullable() {
    assert_eq!(
        column_kind(&DataType::Integer, Nullability::Unknown),
        ColumnKind::NullableInteger
    );
}

#[test]
fn scale_zero_numbers_fit_in_integer() {
    let dt = DataType::Numeric { precision: 10, scale: 0 };
    assert_eq!(column_kind(&dt, Nullability::Nullable), ColumnKind::NullableInteger);

    let dt = DataType::Decimal { precision: 18, scale: 0 };
    assert_eq!(column_kind(&dt, Nullability::NoNulls), ColumnKind::Integer);
}

#[test]
fn wide_or_fractional_numbers_stay_decimal_text() {
    let wide = DataType::Numeric { precision: 38, scale: 0 };
    assert_eq!(column_kind(&wide, Nullability::Nullable), ColumnKind::NullableDecimal);

    let fractional = DataType::Decimal { precision: 10, scale: 2 };
    assert_eq!(column_kind(&fractional, Nullability::NoNulls), ColumnKind::Decimal);

    // Oracle NUMBER without precision reports precision 0.
    let unbounded = DataType::Numeric { precision: 0, scale: 0 };
    assert_eq!(column_kind(&unbounded, Nullability::Nullable), ColumnKind::NullableDecimal);
}

#[test]
fn floating_types_map_to_double_kinds() {
    for dt in [DataType::Real, DataType::Double, DataType::Float { precision: 53 }] {
        assert_eq!(column_kind(&dt, Nullability::Nullable), ColumnKind::NullableDouble);
        assert_eq!(column_kind(&dt, Nullability::NoNulls), ColumnKind::Double);
    }
}

#[test]
fn dates_and_timestamps_map_to_nullable_timestamp() {
    assert_eq!(
        column_kind(&DataType::Date, Nullability::NoNulls),
        ColumnKind::NullableTimestamp
    );
    assert_eq!(
        column_kind(&DataType::Timestamp { precision: 6 }, Nullability::Nullable),
        ColumnKind::NullableTimestamp
    );
}

#[test]
fn character_types_map_to_text() {
    assert_eq!(
        column_kind(&DataType::Varchar { length: None }, Nullability::Nullable),
        ColumnKind::NullableText
    );
    assert_eq!(
        column_kind(&DataType::WChar { length: None }, Nullability::NoNulls),
        ColumnKind::Text
    );
}

#[test]
fn everything_else_is_opaque() {
    assert_eq!(column_kind(&DataType::Unknown, Nullability::Nullable), ColumnKind::Opaque);
    assert_eq!(
        column_kind(&DataType::Varbinary { length: None }, Nullability::NoNulls),
        ColumnKind::Opaque
    );
}

#[test]
fn canonical_decimal_restores_leading_zero() {
    assert_eq!(canonical_decimal(".5"), "0.5");
    assert_eq!(canonical_decimal("-.25"), "-0.25");
    assert_eq!(canonical_decimal(" 12.50 "), "12.50");
    assert_eq!(canonical_decimal("-7"), "-7");
}

#[test]
fn dsn_name_becomes_dsn_attribute() {
    let conn = make_connection("ORCL");
    assert_eq!(connection_string(&conn), "DSN=ORCL;");
}

#[test]
fn full_connection_string_is_used_verbatim_with_credentials_appended() {
    let mut conn = make_connection("Driver={Oracle 19 ODBC driver};DBQ=localhost:1524/MIS;");
    conn.user = Some("scott".to_string());
    conn.password = Some(SecretString::from("tiger".to_string()));

    assert_eq!(
        connection_string(&conn),
        "Driver={Oracle 19 ODBC driver};DBQ=localhost:1524/MIS;UID=scott;PWD=tiger;"
    );
}

#[test]
fn password_with_separator_is_escaped() {
    let mut conn = make_connection("ORCL");
    conn.password = Some(SecretString::from("pa;ss".to_string()));
    assert_eq!(connection_string(&conn), "DSN=ORCL;PWD={pa;ss};");
}
