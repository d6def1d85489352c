//! Unit tests for entity construction from SQL and identity keys

use pg_drift::model::{QualifiedName, DEFAULT_SCHEMA};
use pg_drift::parser::split_statements;
use pg_drift::{Entity, EntityKind, IdentityKey};

fn entity(sql: &str) -> Entity {
    Entity::from_sql(sql).unwrap()
}

// ============================================================================
// Identity
// ============================================================================

#[test]
fn test_function_identity_excludes_names_defaults_and_out_args() {
    let a = entity("CREATE FUNCTION app.total(IN amount numeric(10,2), OUT result numeric) AS $$ select amount $$ LANGUAGE sql");
    let b = entity("CREATE OR REPLACE FUNCTION app.total(value decimal DEFAULT 0) RETURNS numeric AS $$ select value $$ LANGUAGE sql");
    assert_eq!(a.identity(), b.identity());
    assert_eq!(
        a.identity(),
        IdentityKey::new(EntityKind::Function, Some("app".into()), "total(numeric)")
    );
}

#[test]
fn test_identifier_folding() {
    let unquoted = entity("CREATE VIEW Reporting.Daily AS SELECT 1");
    let quoted = entity("CREATE VIEW \"reporting\".\"daily\" AS SELECT 1");
    let mixed_case = entity("CREATE VIEW \"Reporting\".\"Daily\" AS SELECT 1");
    assert_eq!(unquoted.identity(), quoted.identity());
    assert_ne!(unquoted.identity(), mixed_case.identity());
}

#[test]
fn test_unqualified_entities_resolve_to_public() {
    let view = entity("CREATE VIEW v AS SELECT 1");
    assert_eq!(view.schema(), None);
    assert_eq!(view.identity().schema.as_deref(), Some(DEFAULT_SCHEMA));
    assert_eq!(view.identity_with(true).schema, None);
}

#[test]
fn test_same_trigger_name_on_different_tables() {
    let a = entity("CREATE TRIGGER touch BEFORE UPDATE ON orders FOR EACH ROW EXECUTE FUNCTION touch()");
    let b = entity("CREATE TRIGGER touch BEFORE UPDATE ON invoices FOR EACH ROW EXECUTE FUNCTION touch()");
    assert_ne!(a.identity(), b.identity());
    assert_eq!(a.identity().signature, "touch ON orders");
}

#[test]
fn test_policy_schema_from_table() {
    let policy = entity("CREATE POLICY tenant_isolation ON app.accounts USING (tenant_id = current_setting('app.tenant')::int)");
    assert_eq!(policy.schema(), Some("app"));
    assert_eq!(policy.kind(), EntityKind::Policy);
    assert_eq!(policy.dependency_tier(), 4);
}

// ============================================================================
// Rendering round trips
// ============================================================================

#[test]
fn test_render_create_round_trips_through_from_sql() {
    let sources = [
        "CREATE FUNCTION public.add(a int, b int) RETURNS int LANGUAGE sql IMMUTABLE AS 'select a + b'",
        "CREATE PROCEDURE app.archive(cutoff date) LANGUAGE sql AS $$ delete from t where d < cutoff $$",
        "CREATE VIEW app.active (id, name) AS SELECT id, name FROM users WHERE active",
        "CREATE MATERIALIZED VIEW app.totals AS SELECT count(*) FROM orders WITH NO DATA",
        "CREATE CONSTRAINT TRIGGER check_total AFTER INSERT ON app.orders DEFERRABLE FOR EACH ROW EXECUTE FUNCTION check_total()",
        "CREATE POLICY owner_only ON app.accounts FOR SELECT USING (owner = current_user)",
    ];
    for sql in sources {
        let parsed = entity(sql);
        assert_eq!(parsed.render_create(), sql);
        assert_eq!(entity(&parsed.render_create()), parsed);
    }
}

#[test]
fn test_drop_statements() {
    let drops: Vec<String> = [
        "CREATE FUNCTION public.add(a int, b int = 0) RETURNS int LANGUAGE sql AS 'select a + b'",
        "CREATE VIEW v AS SELECT 1",
        "CREATE TRIGGER t AFTER INSERT ON app.orders FOR EACH ROW EXECUTE FUNCTION f()",
    ]
    .iter()
    .map(|sql| entity(sql).render_drop(false))
    .collect();
    assert_eq!(
        drops,
        vec![
            "DROP FUNCTION public.add(integer, integer)",
            "DROP VIEW v",
            "DROP TRIGGER t ON app.orders",
        ]
    );
}

#[test]
fn test_reserved_words_render_quoted() {
    let view = entity(r#"CREATE VIEW "order" AS SELECT 1"#);
    assert_eq!(view.render_drop(false), r#"DROP VIEW "order""#);
    assert_eq!(view.render_create(), r#"CREATE VIEW "order" AS SELECT 1"#);
    assert_eq!(entity(&view.render_create()), view);

    let trigger = entity(
        r#"CREATE TRIGGER audit AFTER INSERT ON "user"."table" FOR EACH ROW EXECUTE FUNCTION log_row()"#,
    );
    assert_eq!(trigger.render_drop(false), r#"DROP TRIGGER audit ON "user"."table""#);
}

#[test]
fn test_atomic_replace_support() {
    let kinds: Vec<(EntityKind, bool)> = [
        "CREATE FUNCTION f() RETURNS int LANGUAGE sql AS 'select 1'",
        "CREATE VIEW v AS SELECT 1",
        "CREATE MATERIALIZED VIEW mv AS SELECT 1",
        "CREATE POLICY p ON t",
    ]
    .iter()
    .map(|sql| {
        let e = entity(sql);
        (e.kind(), e.render_replace().is_some())
    })
    .collect();
    assert_eq!(
        kinds,
        vec![
            (EntityKind::Function, true),
            (EntityKind::View, true),
            (EntityKind::MaterializedView, false),
            (EntityKind::Policy, false),
        ]
    );
}

#[test]
fn test_qualified_name_parse() {
    let name = QualifiedName::parse("\"Sales\" . orders");
    assert_eq!(name.schema.as_deref(), Some("Sales"));
    assert_eq!(name.name, "orders");
    assert_eq!(name.to_string(), "\"Sales\".orders");
}

// ============================================================================
// Scripts
// ============================================================================

#[test]
fn test_script_statements_become_entities() {
    let script = "\
-- functions
CREATE FUNCTION touch() RETURNS trigger LANGUAGE plpgsql AS $$
BEGIN
    NEW.updated_at := now();
    RETURN NEW;
END;
$$;

CREATE TRIGGER touch BEFORE UPDATE ON orders
    FOR EACH ROW EXECUTE FUNCTION touch();
";
    let entities: Vec<Entity> = split_statements(script)
        .unwrap()
        .iter()
        .map(|sql| entity(sql))
        .collect();
    assert_eq!(entities.len(), 2);
    assert_eq!(entities[0].kind(), EntityKind::Function);
    assert!(entities[0].definition().contains("NEW.updated_at := now();"));
    assert_eq!(entities[1].kind(), EntityKind::Trigger);
}
