use std::sync::Arc;

use crate::fake::FakeQueryer;
use crate::*;

fn employees() -> TableIdent {
    TableIdent::new("app", "public", "employees")
}

fn setup() -> (Arc<FakeQueryer>, Table) {
    let fake = Arc::new(FakeQueryer::new());
    let table = Table::new(fake.clone(), employees());
    (fake, table)
}

fn scoped(record: Record) -> Record {
    record
        .with("table_catalog", "app")
        .with("table_schema", "public")
        .with("table_name", "employees")
}

fn column_row(name: &str, position: i32, data_type: &str, nullable: &str) -> Record {
    scoped(Record::new())
        .with("column_name", name)
        .with("ordinal_position", position)
        .with("column_default", Value::Null)
        .with("is_nullable", nullable)
        .with("data_type", data_type)
        .with("udt_name", Value::Null)
        .with("character_maximum_length", Value::Null)
        .with("character_octet_length", Value::Null)
        .with("numeric_precision", Value::Null)
        .with("numeric_precision_radix", Value::Null)
        .with("numeric_scale", Value::Null)
        .with("datetime_precision", Value::Null)
        .with("is_identity", "NO")
        .with("identity_generation", Value::Null)
        .with("is_generated", "NEVER")
        .with("generation_expression", Value::Null)
        .with("is_updatable", "YES")
}

fn constraint_row(name: &str, kind: &str) -> Record {
    scoped(Record::new())
        .with("constraint_catalog", "app")
        .with("constraint_schema", "public")
        .with("constraint_name", name)
        .with("constraint_type", kind)
        .with("is_deferrable", "NO")
        .with("initially_deferred", "NO")
}

/// `target` is the referenced table, column and key constraint; the raw
/// `pg_constraint` codes decode to `NONE`, `NO ACTION` and `CASCADE`.
fn fk_row(
    constraint: &str,
    column: &str,
    position: i32,
    target: (&str, &str, Option<&str>),
) -> Record {
    let (table, target_column, target_key) = target;
    Record::new()
        .with("constraint_name", constraint)
        .with("column_name", column)
        .with("ordinal_position", position)
        .with("referenced_catalog", "app")
        .with("referenced_schema", "public")
        .with("referenced_name", table)
        .with("referenced_column", target_column)
        .with("referenced_constraint", target_key)
        .with("match_option", "s")
        .with("update_rule", "a")
        .with("delete_rule", "c")
}

fn privilege_row(grantee: &str, privilege: &str, grantable: Value) -> Record {
    scoped(Record::new())
        .with("grantor", "postgres")
        .with("grantee", grantee)
        .with("privilege_type", privilege)
        .with("is_grantable", grantable)
        .with("with_hierarchy", "NO")
}

fn view_row(name: &str, definition: Value) -> Record {
    Record::new()
        .with("view_catalog", "app")
        .with("view_schema", "public")
        .with("view_name", name)
        .with("view_definition", definition)
        .with("check_option", "NONE")
        .with("is_updatable", "YES")
        .with("is_insertable_into", "YES")
}

fn scope_args() -> Vec<Value> {
    vec![
        Value::from("app"),
        Value::from("public"),
        Value::from("employees"),
    ]
}

#[tokio::test]
async fn test_columns_in_ordinal_order() {
    let (fake, table) = setup();
    fake.respond(vec![
        column_row("id", 1, "integer", "NO"),
        column_row("person_id", 2, "integer", "NO"),
        column_row("org_id", 3, "integer", "YES"),
    ]);

    let columns = table.columns().await.unwrap();
    let summary: Vec<_> = columns
        .iter()
        .map(|c| (c.ordinal_position, c.name.as_str(), c.is_nullable))
        .collect();
    assert_eq!(
        summary,
        vec![
            (1, "id", Tristate::No),
            (2, "person_id", Tristate::No),
            (3, "org_id", Tristate::Yes),
        ]
    );
    assert!(columns.iter().all(|c| c.table == employees()));

    let calls = fake.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].sql.contains(r#"FROM "information_schema"."columns" "c""#));
    assert!(calls[0].sql.ends_with(r#"ORDER BY "c"."ordinal_position" ASC"#));
    assert_eq!(calls[0].args, scope_args());
}

#[tokio::test]
async fn test_column_by_name_matches_listing() {
    let (fake, table) = setup();
    fake.respond(vec![
        column_row("id", 1, "integer", "NO"),
        column_row("person_id", 2, "integer", "NO"),
    ]);
    fake.respond(vec![column_row("id", 1, "integer", "NO")]);

    let listed = table.columns().await.unwrap();
    let id = table.column("id").await.unwrap();
    assert_eq!(id, listed[0]);

    let calls = fake.calls();
    assert!(calls[1].sql.contains(r#""c"."column_name"::text = $4"#));
    assert_eq!(calls[1].args.last(), Some(&Value::from("id")));
}

#[tokio::test]
async fn test_column_not_found() {
    let (fake, table) = setup();
    fake.respond(vec![]);

    let err = table.column("salary").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        err.to_string(),
        r#"column "salary" not found on app.public.employees"#
    );
}

#[tokio::test]
async fn test_constraints_resolve_foreign_keys() {
    let (fake, table) = setup();
    fake.respond(vec![
        constraint_row("employees_org_id_fkey", "FOREIGN KEY"),
        constraint_row("employees_person_id_fkey", "FOREIGN KEY"),
        constraint_row("employees_pkey", "PRIMARY KEY"),
    ]);
    fake.respond(vec![
        fk_row("employees_org_id_fkey", "org_id", 1, ("org", "id", Some("org_pkey"))),
        fk_row(
            "employees_person_id_fkey",
            "person_id",
            1,
            ("person", "id", Some("person_pkey")),
        ),
    ]);

    let constraints = table.constraints().await.unwrap();
    assert_eq!(constraints.len(), 3);

    let org = constraints[0].foreign_key.as_ref().unwrap();
    assert_eq!(org.referenced, TableIdent::new("app", "public", "org"));
    assert_eq!(org.referenced_constraint.as_deref(), Some("org_pkey"));
    assert_eq!(org.columns, vec!["org_id"]);
    assert_eq!(org.referenced_columns, vec!["id"]);
    assert_eq!(org.match_option.as_deref(), Some("NONE"));
    assert_eq!(org.update_rule.as_deref(), Some("NO ACTION"));
    assert_eq!(org.delete_rule.as_deref(), Some("CASCADE"));

    let person = constraints[1].foreign_key.as_ref().unwrap();
    assert_eq!(person.referenced.name, "person");

    assert_eq!(constraints[2].kind, ConstraintKind::PrimaryKey);
    assert_eq!(constraints[2].foreign_key, None);

    let calls = fake.calls();
    assert_eq!(calls.len(), 2);
    insta::assert_snapshot!(calls[1].sql, @r#"
    SELECT "con"."conname"::text AS "constraint_name", "a"."attname"::text AS "column_name", array_position("con"."conkey", "a"."attnum")::integer AS "ordinal_position", current_database()::text AS "referenced_catalog", "rn"."nspname"::text AS "referenced_schema", "rt"."relname"::text AS "referenced_name", "ra"."attname"::text AS "referenced_column", "uc"."conname"::text AS "referenced_constraint", "con"."confmatchtype"::text AS "match_option", "con"."confupdtype"::text AS "update_rule", "con"."confdeltype"::text AS "delete_rule"
    FROM "pg_catalog"."pg_constraint" "con"
    INNER JOIN "pg_catalog"."pg_class" "t" ON "t"."oid" = "con"."conrelid"
    INNER JOIN "pg_catalog"."pg_namespace" "n" ON "n"."oid" = "t"."relnamespace"
    INNER JOIN "pg_catalog"."pg_attribute" "a" ON "a"."attrelid" = "con"."conrelid"
    INNER JOIN "pg_catalog"."pg_class" "rt" ON "rt"."oid" = "con"."confrelid"
    INNER JOIN "pg_catalog"."pg_namespace" "rn" ON "rn"."oid" = "rt"."relnamespace"
    INNER JOIN "pg_catalog"."pg_attribute" "ra" ON "ra"."attrelid" = "con"."confrelid" AND array_position("con"."confkey", "ra"."attnum") = array_position("con"."conkey", "a"."attnum")
    LEFT JOIN "pg_catalog"."pg_constraint" "uc" ON "uc"."conrelid" = "con"."confrelid" AND "uc"."conindid" = "con"."conindid" AND "uc"."contype"::text IN ('p', 'u')
    WHERE current_database()::text = $1 AND "n"."nspname"::text = $2 AND "t"."relname"::text = $3 AND "con"."contype"::text = 'f' AND "con"."conname"::text IN ($4, $5)
    ORDER BY "con"."conname" ASC, array_position("con"."conkey", "a"."attnum") ASC
    "#);

    let mut expected = scope_args();
    expected.push(Value::from("employees_org_id_fkey"));
    expected.push(Value::from("employees_person_id_fkey"));
    assert_eq!(calls[1].args, expected);
}

#[tokio::test]
async fn test_composite_foreign_key_pairs_columns() {
    let (fake, table) = setup();
    fake.respond(vec![constraint_row("employees_badge_fkey", "FOREIGN KEY")]);
    fake.respond(vec![
        fk_row(
            "employees_badge_fkey",
            "badge_no",
            2,
            ("badge", "no", Some("badge_pkey")),
        ),
        fk_row(
            "employees_badge_fkey",
            "badge_site",
            1,
            ("badge", "site", Some("badge_pkey")),
        ),
    ]);

    let fks = table.foreign_keys().await.unwrap();
    let fk = fks[0].foreign_key.as_ref().unwrap();
    assert_eq!(fk.columns, vec!["badge_site", "badge_no"]);
    assert_eq!(fk.referenced_columns, vec!["site", "no"]);
    assert_eq!(fk.referenced.name, "badge");
}

#[tokio::test]
async fn test_foreign_key_to_unique_index() {
    let (fake, table) = setup();
    fake.respond(vec![constraint_row("employees_badge_code_fkey", "FOREIGN KEY")]);
    fake.respond(vec![fk_row(
        "employees_badge_code_fkey",
        "badge_code",
        1,
        ("badge", "code", None),
    )]);

    let fks = table.foreign_keys().await.unwrap();
    let fk = fks[0].foreign_key.as_ref().unwrap();
    assert_eq!(fk.referenced.name, "badge");
    assert_eq!(fk.referenced_constraint, None);
    assert_eq!(fk.columns, vec!["badge_code"]);
    assert_eq!(fk.referenced_columns, vec!["code"]);
}

#[tokio::test]
async fn test_foreign_key_name_shared_with_other_table() {
    let (fake, table) = setup();
    fake.respond(vec![constraint_row("fk_owner", "FOREIGN KEY")]);
    // what a lookup keyed on the name alone returns when another table in
    // the schema has an fk_owner pointing elsewhere
    fake.respond(vec![
        fk_row("fk_owner", "owner_id", 1, ("orgs", "id", Some("orgs_pkey"))),
        fk_row("fk_owner", "owner_id", 1, ("users", "id", Some("users_pkey"))),
    ]);

    let err = table.foreign_keys().await.unwrap_err();
    match err {
        Error::Decode {
            operation, source, ..
        } => {
            assert_eq!(operation, "resolve_foreign_keys");
            assert_eq!(
                source,
                DecodeError::InconsistentForeignKey {
                    constraint: "fk_owner".to_owned(),
                    reason: "rows name more than one referenced key",
                }
            );
        }
        other => panic!("expected a decode error, got {other:?}"),
    }

    // the resolution query itself is keyed on the owning table
    let calls = fake.calls();
    assert!(calls[1].sql.contains(r#""n"."nspname"::text = $2"#));
    assert!(calls[1].sql.contains(r#""t"."relname"::text = $3"#));
    assert_eq!(calls[1].args[..3], scope_args()[..]);
}

#[tokio::test]
async fn test_foreign_key_position_gap() {
    let (fake, table) = setup();
    fake.respond(vec![constraint_row("employees_badge_fkey", "FOREIGN KEY")]);
    fake.respond(vec![
        fk_row("employees_badge_fkey", "badge_site", 1, ("badge", "site", None)),
        fk_row("employees_badge_fkey", "badge_no", 3, ("badge", "no", None)),
    ]);

    let err = table.constraints().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Decode {
            source: DecodeError::InconsistentForeignKey {
                reason: "key column positions are not 1..n",
                ..
            },
            ..
        }
    ));
}

#[tokio::test]
async fn test_foreign_key_duplicate_position() {
    let (fake, table) = setup();
    fake.respond(vec![constraint_row("employees_badge_fkey", "FOREIGN KEY")]);
    fake.respond(vec![
        fk_row("employees_badge_fkey", "badge_site", 1, ("badge", "site", None)),
        fk_row("employees_badge_fkey", "badge_site", 1, ("badge", "site", None)),
    ]);

    let err = table.foreign_keys().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Decode {
            source: DecodeError::InconsistentForeignKey { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_unknown_referential_action() {
    let (fake, table) = setup();
    fake.respond(vec![constraint_row("employees_org_id_fkey", "FOREIGN KEY")]);
    fake.respond(vec![
        fk_row("employees_org_id_fkey", "org_id", 1, ("org", "id", Some("org_pkey")))
            .with("delete_rule", "x"),
    ]);

    let err = table.foreign_keys().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Decode {
            operation: "resolve_foreign_keys",
            source: DecodeError::UnknownCode { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_foreign_key_query_failure_names_operation() {
    let (fake, table) = setup();
    fake.respond(vec![constraint_row("employees_org_id_fkey", "FOREIGN KEY")]);
    fake.fail("canceling statement due to statement timeout");

    let err = table.constraints().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Query {
            operation: "resolve_foreign_keys",
            ..
        }
    ));
    assert_eq!(err.table(), &employees());
    assert_eq!(
        err.to_string(),
        "resolve_foreign_keys on app.public.employees: query failed: \
         canceling statement due to statement timeout"
    );
}

#[tokio::test]
async fn test_constraints_by_type_filters_in_query() {
    let (fake, table) = setup();
    fake.respond(vec![constraint_row("employees_pkey", "PRIMARY KEY")]);

    let pks = table
        .constraints_by_type(ConstraintKind::PrimaryKey)
        .await
        .unwrap();
    assert_eq!(pks.len(), 1);
    assert_eq!(pks[0].table, employees());

    let calls = fake.calls();
    assert_eq!(calls.len(), 1, "no foreign keys, no resolution query");
    assert!(calls[0].sql.contains(r#""tc"."constraint_type"::text = $4"#));
    assert_eq!(calls[0].args[3], Value::from("PRIMARY KEY"));
}

#[tokio::test]
async fn test_no_foreign_keys_is_empty() {
    let (fake, table) = setup();
    fake.respond(vec![]);

    assert!(table.foreign_keys().await.unwrap().is_empty());
    assert_eq!(fake.calls().len(), 1);
}

#[tokio::test]
async fn test_unknown_constraint_kind() {
    let (fake, table) = setup();
    fake.respond(vec![constraint_row("employees_excl", "EXCLUDE")]);

    let err = table.constraints().await.unwrap_err();
    match err {
        Error::Decode {
            operation, source, ..
        } => {
            assert_eq!(operation, "constraints");
            assert_eq!(
                source,
                DecodeError::UnknownConstraintKind("EXCLUDE".to_owned())
            );
        }
        other => panic!("expected a decode error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unresolved_foreign_key() {
    let (fake, table) = setup();
    fake.respond(vec![constraint_row("employees_org_id_fkey", "FOREIGN KEY")]);
    fake.respond(vec![]);

    let err = table.foreign_keys().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Decode {
            source: DecodeError::UnresolvedForeignKey { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_constraint_by_name() {
    let (fake, table) = setup();
    fake.respond(vec![constraint_row("employees_pkey", "PRIMARY KEY")]);
    fake.respond(vec![]);

    let pk = table.constraint("employees_pkey").await.unwrap();
    assert_eq!(pk.name, "employees_pkey");
    assert_eq!(pk.table, employees());
    assert_eq!(pk.is_deferrable, Tristate::No);

    let err = table.constraint("nope").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        fake.calls()[1].args.last(),
        Some(&Value::from("nope"))
    );
}

#[tokio::test]
async fn test_primary_key() {
    let (fake, table) = setup();
    fake.respond(vec![constraint_row("employees_pkey", "PRIMARY KEY")]);

    let pk = table.primary_key().await.unwrap();
    assert_eq!(pk.kind, ConstraintKind::PrimaryKey);
}

#[tokio::test]
async fn test_primary_key_missing() {
    let (fake, table) = setup();
    fake.respond(vec![]);

    let err = table.primary_key().await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_primary_key_ambiguous() {
    let (fake, table) = setup();
    fake.respond(vec![
        constraint_row("a_pkey", "PRIMARY KEY"),
        constraint_row("b_pkey", "PRIMARY KEY"),
    ]);

    let err = table.primary_key().await.unwrap_err();
    assert!(matches!(err, Error::AmbiguousPrimaryKey { count: 2, .. }));
}

#[tokio::test]
async fn test_key_columns() {
    let (fake, table) = setup();
    fake.respond(vec![
        Record::new()
            .with("constraint_name", "employees_pkey")
            .with("column_name", "id")
            .with("ordinal_position", 1)
            .with("position_in_unique_constraint", Value::Null),
    ]);

    let keys = table.key_columns("employees_pkey").await.unwrap();
    assert_eq!(
        keys,
        vec![KeyColumn {
            constraint_name: "employees_pkey".to_owned(),
            column_name: "id".to_owned(),
            ordinal_position: 1,
            position_in_unique_constraint: None,
        }]
    );
    assert_eq!(fake.calls().len(), 1);
}

#[tokio::test]
async fn test_key_columns_of_check_constraint() {
    let (fake, table) = setup();
    fake.respond(vec![]);
    fake.respond(vec![constraint_row("employees_id_check", "CHECK")]);

    let keys = table.key_columns("employees_id_check").await.unwrap();
    assert!(keys.is_empty());
    assert_eq!(fake.calls().len(), 2);
}

#[tokio::test]
async fn test_key_columns_of_missing_constraint() {
    let (fake, table) = setup();
    fake.respond(vec![]);
    fake.respond(vec![]);

    let err = table.key_columns("nope").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_privileges_keep_unknown() {
    let (fake, table) = setup();
    fake.respond(vec![
        privilege_row("postgres", "INSERT", Value::from("YES")),
        privilege_row("postgres", "SELECT", Value::from("YES")),
        privilege_row("reporting", "SELECT", Value::Null),
    ]);

    let privileges = table.privileges().await.unwrap();
    assert_eq!(privileges.len(), 3);
    assert_eq!(privileges[0].is_grantable, Tristate::Yes);
    assert_eq!(privileges[2].is_grantable, Tristate::Unknown);
    assert_eq!(privileges[2].with_hierarchy, Tristate::No);

    insta::assert_snapshot!(fake.calls()[0].sql, @r#"
    SELECT "p"."table_catalog"::text AS "table_catalog", "p"."table_schema"::text AS "table_schema", "p"."table_name"::text AS "table_name", "p"."grantor"::text AS "grantor", "p"."grantee"::text AS "grantee", "p"."privilege_type"::text AS "privilege_type", "p"."is_grantable"::text AS "is_grantable", "p"."with_hierarchy"::text AS "with_hierarchy"
    FROM "information_schema"."table_privileges" "p"
    WHERE "p"."table_catalog"::text = $1 AND "p"."table_schema"::text = $2 AND "p"."table_name"::text = $3
    ORDER BY "p"."grantee" ASC, "p"."privilege_type" ASC
    "#);
}

#[tokio::test]
async fn test_invalid_yes_or_no() {
    let (fake, table) = setup();
    fake.respond(vec![privilege_row("postgres", "SELECT", Value::from("MAYBE"))]);

    let err = table.privileges().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Decode {
            source: DecodeError::InvalidYesOrNo { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_in_views() {
    let (fake, table) = setup();
    fake.respond(vec![view_row(
        "employee_view",
        Value::from(" SELECT employees.id FROM employees;"),
    )]);

    let views = table.in_views().await.unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(
        views[0].view,
        TableIdent::new("app", "public", "employee_view")
    );
    assert!(!views[0].definition.is_empty());
    assert_eq!(views[0].is_updatable, Tristate::Yes);

    let sql = &fake.calls()[0].sql;
    assert!(sql.contains(r#"FROM "information_schema"."view_table_usage" "u""#));
    assert!(sql.contains(r#"INNER JOIN "information_schema"."views" "v""#));
    assert!(sql.contains(r#"WHERE "u"."table_catalog"::text = $1"#));
}

#[tokio::test]
async fn test_in_views_rejects_hidden_definition() {
    for definition in [Value::Null, Value::from("")] {
        let (fake, table) = setup();
        fake.respond(vec![view_row("employee_view", definition)]);

        let err = table.in_views().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Decode {
                source: DecodeError::Empty { .. },
                ..
            }
        ));
    }
}

#[tokio::test]
async fn test_query_failure_carries_context() {
    let (fake, table) = setup();
    fake.fail("connection reset");

    let err = table.columns().await.unwrap_err();
    assert_eq!(err.table(), &employees());
    assert_eq!(
        err.to_string(),
        "columns on app.public.employees: query failed: connection reset"
    );
}

#[tokio::test]
async fn test_every_call_queries_again() {
    let (fake, table) = setup();
    let rows = vec![
        column_row("id", 1, "integer", "NO"),
        column_row("person_id", 2, "integer", "NO"),
    ];
    fake.respond(rows.clone());
    fake.respond(rows);

    let first = table.columns().await.unwrap();
    let second = table.columns().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(fake.calls().len(), 2);
    assert_eq!(fake.remaining(), 0);
}

#[tokio::test]
async fn test_clones_share_queryer() {
    let (fake, table) = setup();
    fake.respond(vec![]);
    fake.respond(vec![]);

    let other = table.clone();
    let (a, b) = tokio::join!(table.privileges(), other.privileges());
    assert!(a.unwrap().is_empty());
    assert!(b.unwrap().is_empty());
    assert_eq!(fake.calls().len(), 2);
}
