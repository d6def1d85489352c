//! Unit tests for routine normalization
//!
//! These tests exercise the normalizer through the public API, including a
//! substituted grammar backend.

use pg_drift::normalize::{NormalizedForm, Normalizer};
use pg_drift::parser::{ParsedRoutine, PostgresGrammar, RoutineGrammar};
use pg_drift::{Entity, ParseError};
use pretty_assertions::assert_eq;
use sqlparser::tokenizer::Token;

fn normalize(signature: &str, definition: &str) -> Result<NormalizedForm, ParseError> {
    Normalizer::new().normalize(definition, signature, false)
}

// ============================================================================
// Synonymous spellings
// ============================================================================

#[test]
fn test_type_synonyms_in_signature_and_returns() {
    assert_eq!(
        normalize("f(a int4, b varchar(10))", "RETURNS bool LANGUAGE sql AS 'select true'").unwrap(),
        normalize(
            "f(a integer, b character varying(10))",
            "RETURNS boolean LANGUAGE sql AS 'select true'"
        )
        .unwrap()
    );
}

#[test]
fn test_quoted_char_is_not_character() {
    let single_byte = Entity::function(None, "f(c \"char\")", "RETURNS int LANGUAGE sql AS 'select 1'");
    let bpchar = Entity::function(None, "f(c character(1))", "RETURNS int LANGUAGE sql AS 'select 1'");
    assert_ne!(single_byte.identity(), bpchar.identity());
    assert_ne!(
        normalize("f(c \"char\")", "RETURNS int LANGUAGE sql AS 'select 1'").unwrap(),
        normalize("f(c char)", "RETURNS int LANGUAGE sql AS 'select 1'").unwrap()
    );
}

#[test]
fn test_external_security_is_dropped() {
    assert_eq!(
        normalize("f()", "RETURNS int LANGUAGE sql EXTERNAL SECURITY DEFINER AS 'select 1'").unwrap(),
        normalize("f()", "RETURNS int LANGUAGE sql SECURITY DEFINER AS 'select 1'").unwrap()
    );
}

#[test]
fn test_default_parameter_spellings() {
    assert_eq!(
        normalize("f(a int = 1)", "RETURNS int LANGUAGE sql AS 'select a'").unwrap(),
        normalize("f(a int DEFAULT 1)", "RETURNS int LANGUAGE sql AS 'select a'").unwrap()
    );
}

#[test]
fn test_c_function_default_cost() {
    let with_cost = normalize("f()", "RETURNS int LANGUAGE c COST 1 AS 'lib', 'f'").unwrap();
    let without = normalize("f()", "RETURNS int LANGUAGE c AS 'lib', 'f'").unwrap();
    assert_eq!(with_cost, without);
    assert_eq!(with_cost.as_str(), "function f() returns integer language c as 'lib', 'f'");
}

#[test]
fn test_returns_table_columns() {
    let form = normalize(
        "report()",
        "RETURNS TABLE (id int8, label text) LANGUAGE sql STABLE AS $$ select 1, 'a' $$",
    )
    .unwrap();
    assert_eq!(
        form.as_str(),
        "function report() returns table(id bigint, label text) language sql stable as $$ select 1 , 'a' $$"
    );
}

// ============================================================================
// Real differences
// ============================================================================

#[test]
fn test_parameter_rename_is_a_difference() {
    assert_ne!(
        normalize("f(a int)", "RETURNS int LANGUAGE sql AS 'select 1'").unwrap(),
        normalize("f(b int)", "RETURNS int LANGUAGE sql AS 'select 1'").unwrap()
    );
}

#[test]
fn test_security_change_is_a_difference() {
    assert_ne!(
        normalize("f()", "RETURNS int LANGUAGE sql SECURITY DEFINER AS 'select 1'").unwrap(),
        normalize("f()", "RETURNS int LANGUAGE sql AS 'select 1'").unwrap()
    );
}

#[test]
fn test_procedure_and_function_differ() {
    let as_procedure = Normalizer::new()
        .normalize("LANGUAGE sql AS 'select 1'", "p()", true)
        .unwrap();
    assert!(as_procedure.as_str().starts_with("procedure p()"));
}

// ============================================================================
// Failures and injected grammars
// ============================================================================

#[test]
fn test_unknown_option_is_parse_error() {
    assert!(normalize("f()", "RETURNS int LANGUAGE sql FROBNICATE AS 'select 1'").is_err());
}

#[test]
fn test_duplicate_body_is_parse_error() {
    assert!(normalize("f()", "RETURNS int LANGUAGE sql AS 'select 1' AS 'select 2'").is_err());
}

/// Grammar that records nothing and delegates to the built-in one, but
/// rejects anything mentioning `legacy`
struct PickyGrammar;

impl RoutineGrammar for PickyGrammar {
    fn parse_routine(&self, sql: &str) -> Result<ParsedRoutine, ParseError> {
        if sql.contains("legacy") {
            return Err(ParseError::new("legacy syntax"));
        }
        PostgresGrammar.parse_routine(sql)
    }

    fn tokenize(&self, sql: &str) -> Result<Vec<Token>, ParseError> {
        PostgresGrammar.tokenize(sql)
    }
}

#[test]
fn test_substituted_grammar() {
    let normalizer = Normalizer::with_grammar(PickyGrammar);
    assert!(normalizer
        .normalize("RETURNS int LANGUAGE sql AS 'select 1'", "f()", false)
        .is_ok());
    let err = normalizer
        .normalize("RETURNS int LANGUAGE sql AS 'select legacy'", "f()", false)
        .unwrap_err();
    assert_eq!(err.message, "legacy syntax");
}

#[test]
fn test_normalization_is_deterministic() {
    let definition = "RETURNS SETOF int LANGUAGE plpgsql PARALLEL SAFE COST 5 ROWS 10 \
                      SET search_path FROM CURRENT AS $$ BEGIN RETURN NEXT 1; END $$";
    let first = normalize("f()", definition).unwrap();
    for _ in 0..3 {
        assert_eq!(normalize("f()", definition).unwrap(), first);
    }
    assert_eq!(
        first.as_str(),
        "function f() returns setof integer language plpgsql parallel safe cost 5 rows 10 \
         set search_path from current as $$ begin return next 1 ; end $$"
    );
}
