//! Unit tests for the diff engine: reconciliation scenarios and ordering

use pg_drift::model::{Policy, QualifiedName, Trigger, View};
use pg_drift::{diff, DiffConfig, DiffEngine, DriftError, Entity, EntityKind, EntitySet, Operation};

fn set(entities: Vec<Entity>) -> EntitySet {
    EntitySet::from_entities(entities).unwrap()
}

fn f_int(body: &str) -> Entity {
    Entity::function(
        Some("public".into()),
        "f(x int)",
        format!("RETURNS int LANGUAGE sql AS $$ {body} $$"),
    )
}

fn g() -> Entity {
    Entity::function(
        Some("public".into()),
        "g()",
        "RETURNS trigger LANGUAGE plpgsql AS $$ BEGIN RETURN NEW; END $$",
    )
}

fn t() -> Entity {
    Entity::Trigger(Trigger::new(
        "t",
        QualifiedName::new(Some("public".into()), "orders"),
        "BEFORE INSERT",
        "FOR EACH ROW EXECUTE FUNCTION g()",
    ))
}

fn describe(ops: &[Operation]) -> Vec<String> {
    ops.iter().map(ToString::to_string).collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_new_function_is_created() {
    let f = f_int("select x");
    let ops = diff(&set(vec![f.clone()]), &EntitySet::new(), DiffConfig::default()).unwrap();
    assert_eq!(ops, vec![Operation::Create(f)]);
}

#[test]
fn test_removed_function_is_dropped() {
    let f = f_int("select x");
    let ops = diff(&EntitySet::new(), &set(vec![f.clone()]), DiffConfig::default()).unwrap();
    assert_eq!(ops, vec![Operation::Drop(f)]);
}

#[test]
fn test_synonymous_strictness_is_unchanged() {
    let local = Entity::function(
        Some("public".into()),
        "f(x int)",
        "RETURNS int LANGUAGE sql STRICT AS 'select x'",
    );
    let remote = Entity::function(
        Some("public".into()),
        "f(x integer)",
        "RETURNS integer\n    LANGUAGE sql\n    RETURNS NULL ON NULL INPUT\n    AS $function$select x$function$",
    );
    let ops = diff(&set(vec![local]), &set(vec![remote]), DiffConfig::default()).unwrap();
    assert!(ops.is_empty(), "unexpected operations: {:?}", describe(&ops));
}

#[test]
fn test_ignore_schema_matches_unqualified_declaration() {
    let local = Entity::function(None, "f(int)", "RETURNS int LANGUAGE sql AS 'select 1'");
    let remote = Entity::function(
        Some("app".into()),
        "f(int)",
        "RETURNS int LANGUAGE sql AS 'select 1'",
    );
    let config = DiffConfig::new().ignore_schema(true);
    let ops = diff(&set(vec![local.clone()]), &set(vec![remote.clone()]), config).unwrap();
    assert!(ops.is_empty());

    // without the flag the remote lives in another schema
    let ops = diff(&set(vec![local]), &set(vec![remote]), DiffConfig::default()).unwrap();
    assert_eq!(
        describe(&ops),
        vec!["create function public.f(integer)", "drop function app.f(integer)"]
    );
}

#[test]
fn test_function_created_before_trigger() {
    let ops = diff(&set(vec![t(), g()]), &EntitySet::new(), DiffConfig::default()).unwrap();
    assert_eq!(ops, vec![Operation::Create(g()), Operation::Create(t())]);
}

#[test]
fn test_trigger_dropped_before_function() {
    let ops = diff(&EntitySet::new(), &set(vec![t(), g()]), DiffConfig::default()).unwrap();
    assert_eq!(ops, vec![Operation::Drop(t()), Operation::Drop(g())]);
}

// ============================================================================
// Properties
// ============================================================================

fn mixed_set() -> Vec<Entity> {
    vec![
        g(),
        t(),
        f_int("select x"),
        Entity::procedure(Some("public".into()), "archive()", "LANGUAGE sql AS 'delete from t'"),
        Entity::View(View::new(Some("public".into()), "v", "select 1")),
        Entity::Policy(Policy::new(
            "p",
            QualifiedName::new(Some("public".into()), "orders"),
            "USING (true)",
        )),
    ]
}

#[test]
fn test_diff_with_itself_is_empty() {
    let entities = set(mixed_set());
    let report = DiffEngine::new(DiffConfig::default())
        .diff(&entities, &entities)
        .unwrap();
    assert!(report.is_empty());
    // view, trigger and policy are compared verbatim
    assert_eq!(report.degraded.len(), 3);
}

#[test]
fn test_every_missing_entity_created_exactly_once() {
    let entities = mixed_set();
    let ops = diff(&set(entities.clone()), &EntitySet::new(), DiffConfig::default()).unwrap();
    assert_eq!(ops.len(), entities.len());
    for entity in &entities {
        let matching: Vec<&Operation> = ops.iter().filter(|op| op.entity() == entity).collect();
        assert_eq!(matching, vec![&Operation::Create(entity.clone())]);
    }
}

#[test]
fn test_every_removed_entity_dropped_exactly_once() {
    let entities = mixed_set();
    let ops = diff(&EntitySet::new(), &set(entities.clone()), DiffConfig::default()).unwrap();
    assert_eq!(ops.len(), entities.len());
    for entity in &entities {
        assert_eq!(
            ops.iter().filter(|op| **op == Operation::Drop(entity.clone())).count(),
            1
        );
    }
}

#[test]
fn test_tiers_ascend_for_creates_and_descend_for_drops() {
    let local = set(mixed_set());
    let remote = set(vec![
        Entity::function(None, "old_fn()", "RETURNS int LANGUAGE sql AS 'select 1'"),
        Entity::Policy(Policy::new(
            "old_policy",
            QualifiedName::new(None, "orders"),
            "",
        )),
    ]);
    let ops = diff(&local, &remote, DiffConfig::default()).unwrap();

    let first_drop = ops.iter().position(Operation::is_drop).unwrap();
    let (forward, drops) = ops.split_at(first_drop);
    assert!(forward
        .windows(2)
        .all(|w| w[0].entity().dependency_tier() <= w[1].entity().dependency_tier()));
    assert!(drops
        .windows(2)
        .all(|w| w[0].entity().dependency_tier() >= w[1].entity().dependency_tier()));
    assert_eq!(drops[0].entity().kind(), EntityKind::Policy);
    assert_eq!(drops[1].entity().kind(), EntityKind::Function);
}

#[test]
fn test_within_tier_ordered_by_identity() {
    let local = set(vec![
        Entity::function(None, "zeta()", "RETURNS int LANGUAGE sql AS 'select 1'"),
        Entity::function(None, "alpha()", "RETURNS int LANGUAGE sql AS 'select 1'"),
        Entity::function(Some("audit".into()), "mid()", "RETURNS int LANGUAGE sql AS 'select 1'"),
    ]);
    let ops = diff(&local, &EntitySet::new(), DiffConfig::default()).unwrap();
    assert_eq!(
        describe(&ops),
        vec![
            "create function audit.mid()",
            "create function public.alpha()",
            "create function public.zeta()",
        ]
    );
}

#[test]
fn test_diff_is_deterministic() {
    let local = set(mixed_set());
    let remote = set(vec![f_int("select x + 1"), g()]);
    let first = diff(&local, &remote, DiffConfig::default()).unwrap();
    for _ in 0..5 {
        assert_eq!(diff(&local, &remote, DiffConfig::default()).unwrap(), first);
    }
}

#[test]
fn test_changed_body_is_replaced() {
    let ops = diff(
        &set(vec![f_int("select x + 1")]),
        &set(vec![f_int("select x")]),
        DiffConfig::default(),
    )
    .unwrap();
    assert_eq!(
        ops,
        vec![Operation::Replace {
            old: f_int("select x"),
            new: f_int("select x + 1"),
        }]
    );
}

#[test]
fn test_duplicate_registration_is_fatal() {
    let err = EntitySet::from_entities(vec![f_int("select x"), f_int("select 2")]).unwrap_err();
    assert!(matches!(err, DriftError::DuplicateIdentity { .. }));
    assert!(err.to_string().contains("function public.f(integer)"));
}

// ============================================================================
// Verbatim comparison
// ============================================================================

fn unqualified_and_public(schema: Option<String>) -> Vec<Entity> {
    vec![
        Entity::View(View::new(schema.clone(), "v", "SELECT 1")),
        Entity::Trigger(Trigger::new(
            "t",
            QualifiedName::new(schema.clone(), "orders"),
            "BEFORE INSERT",
            "FOR EACH ROW EXECUTE FUNCTION g()",
        )),
        Entity::Policy(Policy::new(
            "p",
            QualifiedName::new(schema.clone(), "orders"),
            "USING (true)",
        )),
        // no LANGUAGE clause: compared verbatim
        Entity::function(schema, "h()", "RETURNS int AS 'select 1'"),
    ]
}

#[test]
fn test_unqualified_declaration_matches_public_snapshot() {
    let local = set(unqualified_and_public(None));
    let remote = set(unqualified_and_public(Some("public".into())));
    assert!(diff(&local, &remote, DiffConfig::default()).unwrap().is_empty());
    assert!(diff(&remote, &local, DiffConfig::default()).unwrap().is_empty());
}

#[test]
fn test_unqualified_declaration_still_differs_from_other_schema() {
    let local = set(vec![Entity::View(View::new(None, "v", "SELECT 1"))]);
    let remote = set(vec![Entity::View(View::new(Some("app".into()), "v", "SELECT 1"))]);
    assert_eq!(
        describe(&diff(&local, &remote, DiffConfig::default()).unwrap()),
        vec!["create view public.v", "drop view app.v"]
    );
}
