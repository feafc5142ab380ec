//! Enum encodings end to end: storage techniques, literal coercion in
//! comparisons, and decode failures.

use pgmap::{
    EnumTechnique, MapError, MappingError, Query, Registry, SqlType, TestRow, Value, col,
    col_enum, enum_lit, lit, materialize,
};

pgmap::pg_enum! {
    pub enum Role {
        Admin = 0,
        Member = 1,
        Guest = 2,
    }
}

pgmap::model! {
    struct Account in "accounts" {
        id: i64 [generated],
        email: String,
        role: Role,
    }
}

#[test]
fn enum_column_type_follows_technique() {
    let as_int = Registry::builder().enums(EnumTechnique::AsInteger).build();
    let table = as_int.table::<Account>();
    assert_eq!(table.column("role").unwrap().ty, SqlType::Int4);

    let as_string = Registry::builder().enums(EnumTechnique::AsString).build();
    let table = as_string.table::<Account>();
    assert_eq!(table.column("role").unwrap().ty, SqlType::Text);
}

#[test]
fn integer_storage_round_trip() {
    let cx = Registry::builder().enums(EnumTechnique::AsInteger).build();
    let row = TestRow::new([
        ("id", Value::Int8(1)),
        ("email", Value::Text("a@b.c".into())),
        ("role", Value::Int4(1)),
    ]);
    let account: Account = materialize(&cx, &row).unwrap();
    assert_eq!(account.role, Role::Member);

    let mut out = Vec::new();
    pgmap::Field::write(&account, &cx, &mut out).unwrap();
    assert_eq!(out[2], Value::Int4(1));
}

#[test]
fn string_storage_round_trip() {
    let cx = Registry::builder().enums(EnumTechnique::AsString).build();
    let row = TestRow::new([
        ("id", Value::Int8(1)),
        ("email", Value::Text("a@b.c".into())),
        ("role", Value::Text("Admin".into())),
    ]);
    let account: Account = materialize(&cx, &row).unwrap();
    assert_eq!(account.role, Role::Admin);

    let mut out = Vec::new();
    pgmap::Field::write(&account, &cx, &mut out).unwrap();
    assert_eq!(out[2], Value::Text("Admin".into()));
}

#[test]
fn unknown_stored_text_is_a_hard_error() {
    let cx = Registry::builder().enums(EnumTechnique::AsString).build();
    let row = TestRow::new([
        ("id", Value::Int8(1)),
        ("email", Value::Text("a@b.c".into())),
        ("role", Value::Text("Superuser".into())),
    ]);
    let err = materialize::<Account, _>(&cx, &row).unwrap_err();
    match err {
        MapError::Mapping(MappingError::UnknownEnumText { ty, text }) => {
            assert_eq!(ty, "Role");
            assert_eq!(text, "Superuser");
        }
        other => panic!("expected unknown enum text, got {other:?}"),
    }
}

#[test]
fn unknown_stored_integer_is_a_hard_error() {
    let cx = Registry::builder().enums(EnumTechnique::AsInteger).build();
    let row = TestRow::new([
        ("id", Value::Int8(1)),
        ("email", Value::Text("a@b.c".into())),
        ("role", Value::Int4(9)),
    ]);
    let err = materialize::<Account, _>(&cx, &row).unwrap_err();
    assert!(matches!(
        err,
        MapError::Mapping(MappingError::UnknownEnumValue { value: 9, .. })
    ));
}

#[test]
fn enum_literal_binds_under_the_active_technique() {
    let as_string = Registry::builder().enums(EnumTechnique::AsString).build();
    let (sql, params) = Query::table::<Account>(&as_string)
        .filter(col(0, "role").eq(enum_lit(Role::Member)))
        .compile(&as_string)
        .unwrap();
    assert!(sql.ends_with(r#"WHERE "role" = $1"#), "{sql}");
    assert_eq!(params, vec![Value::Text("Member".into())]);

    let as_int = Registry::builder().enums(EnumTechnique::AsInteger).build();
    let (_, params) = Query::table::<Account>(&as_int)
        .filter(col(0, "role").eq(enum_lit(Role::Member)))
        .compile(&as_int)
        .unwrap();
    assert_eq!(params, vec![Value::Int4(1)]);
}

#[test]
fn integer_literal_coerces_against_enum_column() {
    // Comparing an enum-typed column with a bare integer re-encodes the
    // integer under the column's technique, on either side.
    let cx = Registry::builder().enums(EnumTechnique::AsString).build();

    let (_, params) = Query::table::<Account>(&cx)
        .filter(col_enum::<Role>(0, "role").eq(lit(0i32)))
        .compile(&cx)
        .unwrap();
    assert_eq!(params, vec![Value::Text("Admin".into())]);

    let (_, params) = Query::table::<Account>(&cx)
        .filter(lit(2i32).eq(col_enum::<Role>(0, "role")))
        .compile(&cx)
        .unwrap();
    assert_eq!(params, vec![Value::Text("Guest".into())]);
}

#[test]
fn coercing_a_nonmember_integer_fails_at_compile_time() {
    let cx = Registry::builder().enums(EnumTechnique::AsString).build();
    let err = Query::table::<Account>(&cx)
        .filter(col_enum::<Role>(0, "role").eq(lit(7i32)))
        .compile(&cx)
        .unwrap_err();
    assert!(err.is_compile(), "{err:?}");
}

#[test]
fn per_type_override_beats_the_default() {
    let cx = Registry::builder()
        .enums(EnumTechnique::AsString)
        .enum_override::<Role>(EnumTechnique::AsInteger)
        .build();
    let (_, params) = Query::table::<Account>(&cx)
        .filter(col(0, "role").eq(enum_lit(Role::Guest)))
        .compile(&cx)
        .unwrap();
    assert_eq!(params, vec![Value::Int4(2)]);
}
