//! Materialization coverage: flattened composites, null-object semantics,
//! converters, and multi-block rows.

use pgmap::{
    FnConvert, MapError, MappingError, NamingConvention, Query, Registry, SqlType, TestRow, Value,
    col, materialize, materialize_all,
};

pgmap::model! {
    struct User in "users" {
        id: i64 [generated],
        name: String,
        age: i32,
    }
}

pgmap::composite! {
    struct Address {
        street: String,
        city: String,
    }
}

pgmap::model! {
    struct Customer in "customers" {
        id: i64 [generated],
        name: String,
        address: Option<Address>,
    }
}

pgmap::model! {
    struct Order in "orders" {
        id: i64 [generated],
        user_id: i64,
        total: f64,
    }
}

#[test]
fn user_row_round_trip() {
    let cx = Registry::new();
    let row = TestRow::new([
        ("id", Value::Int8(1)),
        ("name", Value::Text("Bob".into())),
        ("age", Value::Int4(25)),
    ]);
    let user: User = materialize(&cx, &row).unwrap();
    assert_eq!(
        user,
        User {
            id: 1,
            name: "Bob".into(),
            age: 25,
        }
    );
}

#[test]
fn column_order_in_the_row_does_not_matter() {
    let cx = Registry::new();
    let row = TestRow::new([
        ("age", Value::Int4(25)),
        ("id", Value::Int8(1)),
        ("name", Value::Text("Bob".into())),
    ]);
    let user: User = materialize(&cx, &row).unwrap();
    assert_eq!(user.id, 1);
    assert_eq!(user.age, 25);
}

#[test]
fn nested_composite_reads_flattened_columns() {
    let cx = Registry::builder()
        .naming(NamingConvention::SnakeCase)
        .build();
    let row = TestRow::new([
        ("id", Value::Int8(7)),
        ("name", Value::Text("Acme".into())),
        ("address_street", Value::Text("Main St 1".into())),
        ("address_city", Value::Text("Springfield".into())),
    ]);
    let customer: Customer = materialize(&cx, &row).unwrap();
    assert_eq!(
        customer.address,
        Some(Address {
            street: "Main St 1".into(),
            city: "Springfield".into(),
        })
    );
}

#[test]
fn all_null_block_becomes_none() {
    let cx = Registry::builder()
        .naming(NamingConvention::SnakeCase)
        .build();
    let row = TestRow::new([
        ("id", Value::Int8(8)),
        ("name", Value::Text("NoAddr".into())),
        ("address_street", Value::Null(SqlType::Text)),
        ("address_city", Value::Null(SqlType::Text)),
    ]);
    let customer: Customer = materialize(&cx, &row).unwrap();
    assert_eq!(customer.address, None);
}

#[test]
fn partially_null_block_is_a_mapping_error() {
    let cx = Registry::builder()
        .naming(NamingConvention::SnakeCase)
        .build();
    let row = TestRow::new([
        ("id", Value::Int8(9)),
        ("name", Value::Text("Half".into())),
        ("address_street", Value::Text("Main St 1".into())),
        ("address_city", Value::Null(SqlType::Text)),
    ]);
    let err = materialize::<Customer, _>(&cx, &row).unwrap_err();
    match err {
        MapError::Mapping(MappingError::UnexpectedNull(path)) => {
            assert_eq!(path, "address_city");
        }
        other => panic!("expected unexpected-null, got {other:?}"),
    }
}

#[test]
fn null_in_required_scalar_is_a_mapping_error() {
    let cx = Registry::new();
    let row = TestRow::new([
        ("id", Value::Int8(1)),
        ("name", Value::Null(SqlType::Text)),
        ("age", Value::Int4(30)),
    ]);
    let err = materialize::<User, _>(&cx, &row).unwrap_err();
    assert!(matches!(
        err,
        MapError::Mapping(MappingError::UnexpectedNull(_))
    ));
}

#[test]
fn missing_column_reports_name_and_floor() {
    let cx = Registry::new();
    let row = TestRow::new([("id", Value::Int8(1)), ("name", Value::Text("x".into()))]);
    let err = materialize::<User, _>(&cx, &row).unwrap_err();
    match err {
        MapError::Mapping(MappingError::UnresolvedColumn { name, floor }) => {
            assert_eq!(name, "age");
            assert_eq!(floor, 0);
        }
        other => panic!("expected unresolved column, got {other:?}"),
    }
}

#[test]
fn tuple_of_models_reads_join_regions() {
    // Columns carry the `qual_col` output aliases a joined default
    // projection emits; tuple reads are positional, so the aliases are
    // never consulted and each block consumes its own region in order.
    let cx = Registry::new();
    let row = TestRow::new([
        ("users_id", Value::Int8(1)),
        ("users_name", Value::Text("Bob".into())),
        ("users_age", Value::Int4(25)),
        ("orders_id", Value::Int8(100)),
        ("orders_user_id", Value::Int8(1)),
        ("orders_total", Value::Float8(19.99)),
    ]);
    let (user, order): (User, Order) = materialize(&cx, &row).unwrap();
    assert_eq!(user.id, 1);
    assert_eq!(order.id, 100);
    assert_eq!(order.user_id, 1);
}

#[test]
fn joined_default_projection_reads_back_as_tuple() {
    let cx = Registry::new();
    let orders = cx.table::<Order>();
    let query =
        Query::table::<User>(&cx).join(orders, col(0, "id").eq(col(1, "user_id")));
    let (sql, params) = query.compile(&cx).unwrap();
    assert_eq!(
        sql,
        concat!(
            r#"SELECT "users"."id" AS "users_id", "users"."name" AS "users_name", "#,
            r#""users"."age" AS "users_age", "orders"."id" AS "orders_id", "#,
            r#""orders"."user_id" AS "orders_user_id", "orders"."total" AS "orders_total" "#,
            r#"FROM "users" JOIN "orders" ON "users"."id" = "orders"."user_id""#,
        )
    );
    assert!(params.is_empty());

    // A row shaped exactly like that projection: one column per source
    // column, in source order, under the emitted aliases.
    let row = TestRow::new([
        ("users_id", Value::Int8(1)),
        ("users_name", Value::Text("Bob".into())),
        ("users_age", Value::Int4(25)),
        ("orders_id", Value::Int8(7)),
        ("orders_user_id", Value::Int8(1)),
        ("orders_total", Value::Float8(42.5)),
    ]);
    let (user, order): (User, Order) = materialize(&cx, &row).unwrap();
    assert_eq!((user.id, user.age), (1, 25));
    assert_eq!((order.id, order.user_id), (7, 1));
    assert_eq!(order.total, 42.5);
}

#[test]
fn scalar_and_tuple_reads_are_positional() {
    let cx = Registry::new();
    let row = TestRow::new([("count", Value::Int8(42))]);
    let n: i64 = materialize(&cx, &row).unwrap();
    assert_eq!(n, 42);

    let row = TestRow::new([("a", Value::Text("x".into())), ("b", Value::Bool(true))]);
    let (a, b): (String, bool) = materialize(&cx, &row).unwrap();
    assert_eq!((a.as_str(), b), ("x", true));
}

#[test]
fn converter_applies_on_read_and_write() {
    let cx = Registry::builder()
        .converter::<bool>(FnConvert::new(
            "bool-as-yn",
            |v| match v {
                Value::Text(s) if s == "Y" => Ok(Value::Bool(true)),
                Value::Text(s) if s == "N" => Ok(Value::Bool(false)),
                Value::Null(_) => Ok(Value::Null(SqlType::Bool)),
                other => Err(MappingError::conversion(
                    "flag",
                    "'Y' or 'N'",
                    other.type_name(),
                )),
            },
            |v| match v {
                Value::Bool(true) => Ok(Value::Text("Y".into())),
                Value::Bool(false) => Ok(Value::Text("N".into())),
                other => Ok(other),
            },
        ))
        .build();

    let row = TestRow::new([("flag", Value::Text("Y".into()))]);
    let flag: bool = materialize(&cx, &row).unwrap();
    assert!(flag);

    let mut out = Vec::new();
    pgmap::Field::write(&false, &cx, &mut out).unwrap();
    assert_eq!(out, vec![Value::Text("N".into())]);
}

#[test]
fn writer_output_reads_back_identically() {
    let cx = Registry::builder()
        .naming(NamingConvention::SnakeCase)
        .build();
    let original = Customer {
        id: 11,
        name: "Loop".into(),
        address: Some(Address {
            street: "Ring Rd 3".into(),
            city: "Utrecht".into(),
        }),
    };

    // Pair the flattened column layout with the writer's value order.
    let table = cx.table::<Customer>();
    let mut values = Vec::new();
    pgmap::Field::write(&original, &cx, &mut values).unwrap();
    assert_eq!(values.len(), table.columns.len());
    let row = TestRow::new(
        table
            .columns
            .iter()
            .map(|c| c.name.clone())
            .zip(values)
            .collect::<Vec<_>>(),
    );

    let back: Customer = materialize(&cx, &row).unwrap();
    assert_eq!(back, original);
}

#[test]
fn materialize_all_preserves_row_order() {
    let cx = Registry::new();
    let rows = vec![
        TestRow::new([
            ("id", Value::Int8(1)),
            ("name", Value::Text("a".into())),
            ("age", Value::Int4(20)),
        ]),
        TestRow::new([
            ("id", Value::Int8(2)),
            ("name", Value::Text("b".into())),
            ("age", Value::Int4(30)),
        ]),
    ];
    let users: Vec<User> = materialize_all(&cx, &rows).unwrap();
    let ids: Vec<_> = users.iter().map(|u| u.id).collect();
    assert_eq!(ids, [1, 2]);
}
