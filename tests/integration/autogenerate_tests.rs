//! End-to-end autogenerate tests over the `orders` fixture

use pg_drift::{DiffConfig, DriftError, FallbackReason};
use pretty_assertions::assert_eq;

use crate::common::TestContext;

fn labels(steps: &[pg_drift::render::ScriptStep]) -> Vec<String> {
    steps.iter().map(|s| s.label.clone()).collect()
}

#[test]
fn test_orders_fixture_operations_in_dependency_order() {
    let ctx = TestContext::with_fixture("orders");
    let result = ctx.autogenerate_successfully(DiffConfig::default());

    assert_eq!(
        labels(&result.script.upgrade),
        vec![
            "replace function app.touch_updated_at()",
            "create materialized view app.daily_revenue",
            "create policy app.tenant_isolation ON orders",
            "drop view app.legacy_orders",
        ]
    );
    assert_eq!(
        labels(&result.script.downgrade),
        vec![
            "create view app.legacy_orders",
            "drop policy app.tenant_isolation ON orders",
            "drop materialized view app.daily_revenue",
            "restore function app.touch_updated_at()",
        ]
    );
}

#[test]
fn test_equivalent_spellings_are_not_reported() {
    let ctx = TestContext::with_fixture("orders");
    let result = ctx.autogenerate_successfully(DiffConfig::default());

    // int4 vs integer, $function$ quoting, default PARALLEL/COST clauses
    assert!(!result.script.upgrade_sql().contains("order_total"));
    assert!(!result.script.upgrade_sql().contains("open_orders"));
    assert!(!result.script.upgrade_sql().contains("orders_touch"));
}

#[test]
fn test_verbatim_comparisons_are_reported_as_degraded() {
    let ctx = TestContext::with_fixture("orders");
    let result = ctx.autogenerate_successfully(DiffConfig::default());

    let degraded: Vec<String> = result
        .report
        .degraded
        .iter()
        .map(|d| d.key.to_string())
        .collect();
    assert_eq!(
        degraded,
        vec!["view app.open_orders", "trigger app.orders_touch ON orders"]
    );
    assert!(result
        .report
        .degraded
        .iter()
        .all(|d| d.reason == FallbackReason::UnsupportedVariant));
    assert_eq!(result.report.parse_failures().count(), 0);
}

#[test]
fn test_upgrade_sql_statements() {
    let ctx = TestContext::with_fixture("orders");
    let result = ctx.autogenerate_successfully(DiffConfig::default());
    let upgrade = result.script.upgrade_sql();

    assert!(upgrade.contains("CREATE OR REPLACE FUNCTION app.touch_updated_at()"));
    assert!(upgrade.contains("NEW.updated_at := now();"));
    assert!(upgrade.contains("CREATE MATERIALIZED VIEW app.daily_revenue AS"));
    assert!(upgrade.contains("WITH NO DATA;\n"));
    assert!(upgrade.contains("DROP VIEW app.legacy_orders;\n"));

    let downgrade = result.script.downgrade_sql();
    assert!(downgrade.contains("NEW.modified_at := now();"));
    assert!(downgrade.contains("CREATE VIEW app.legacy_orders AS SELECT * FROM app.orders;\n"));
}

#[test]
fn test_drop_cascade_applies_to_upgrade_drops_only() {
    let ctx = TestContext::with_fixture("orders");
    let result = ctx.autogenerate_successfully(DiffConfig::new().drop_cascade(true));

    assert!(result
        .script
        .upgrade_sql()
        .contains("DROP VIEW app.legacy_orders CASCADE;\n"));
    assert!(!result.script.downgrade_sql().contains("CASCADE"));
}

#[test]
fn test_matching_snapshot_produces_no_changes() {
    let ctx = TestContext::with_fixture("orders");
    let mut snapshot = String::new();
    for file in ["00_tables.sql", "01_functions.sql", "02_views.sql", "03_triggers.sql"] {
        let content = std::fs::read_to_string(ctx.declared_dir().join(file)).unwrap();
        snapshot.push_str(&content);
        snapshot.push('\n');
    }
    ctx.write_file("snapshot.sql", &snapshot);

    let result = ctx.autogenerate_successfully(DiffConfig::default());
    assert!(result.script.is_empty());
    assert!(result.report.is_empty());
}

#[test]
fn test_ignore_schema_matches_across_schemas() {
    let ctx = TestContext::with_fixture("orders");
    ctx.write_file(
        "snapshot.sql",
        "CREATE FUNCTION staging.order_total(order_id integer) RETURNS numeric LANGUAGE sql STABLE \
         AS $$ select sum(amount) from app.order_lines where order_lines.order_id = order_total.order_id $$;",
    );

    let result = ctx.autogenerate_successfully(DiffConfig::new().ignore_schema(true));
    let upgrade = result.script.upgrade_sql();
    assert!(!upgrade.contains("order_total"));
    assert!(upgrade.contains("CREATE FUNCTION touch_updated_at()"));
}

#[test]
fn test_duplicate_declaration_fails_the_pass() {
    let ctx = TestContext::with_fixture("orders");
    ctx.write_file(
        "declared/04_duplicate.sql",
        "CREATE VIEW app.Open_Orders AS SELECT 1;",
    );

    let err = ctx.autogenerate(DiffConfig::default()).unwrap_err();
    match err.downcast_ref::<DriftError>() {
        Some(DriftError::DuplicateIdentity { key, .. }) => {
            assert_eq!(key, "view app.open_orders");
        }
        other => panic!("expected duplicate identity, got {other:?}"),
    }
}

#[test]
fn test_missing_snapshot_is_fatal() {
    let ctx = TestContext::with_fixture("orders");
    std::fs::remove_file(ctx.snapshot_path()).unwrap();

    let err = ctx.autogenerate(DiffConfig::default()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DriftError>(),
        Some(DriftError::IntrospectionUnavailable { .. })
    ));
}

#[test]
fn test_empty_snapshot_directory_creates_everything() {
    let ctx = TestContext::with_fixture("orders");
    std::fs::remove_file(ctx.snapshot_path()).unwrap();
    std::fs::create_dir(ctx.snapshot_path()).unwrap();

    let result = ctx.autogenerate_successfully(DiffConfig::default());
    assert_eq!(result.script.upgrade.len(), 6);
    assert!(result.script.upgrade.iter().all(|s| s.label.starts_with("create ")));
}

#[test]
fn test_literals_output() {
    let ctx = TestContext::with_fixture("orders");
    let config = DiffConfig::new().render_definition_multiline(true);
    let result = ctx.autogenerate_successfully(config);
    let literals = result.script.to_literals(&config);

    assert!(literals.starts_with("// upgrade\n// replace function app.touch_updated_at()\n"));
    assert!(literals.contains("execute(r#\"\nDROP VIEW app.legacy_orders\n\"#);\n"));
    assert!(literals.contains("// downgrade\n"));
}
