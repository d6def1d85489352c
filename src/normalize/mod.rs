//! Canonical forms for routine definitions
//!
//! [`Normalizer::normalize`] parses a function or procedure through a
//! [`RoutineGrammar`] and serializes it back in one canonical spelling:
//!
//! - keywords lower-cased, comments and insignificant whitespace removed
//! - options in a fixed order: language, window, volatility, leakproof,
//!   null-input behavior, security, parallel, cost, rows, support, set
//!   (sorted by parameter), transform, body
//! - `STRICT` rewritten to `returns null on null input`
//! - defaults elided: `volatile`, `called on null input`, `security invoker`,
//!   `not leakproof`, `parallel unsafe`, `cost 100` (`cost 1` for C and
//!   internal routines), `rows 1000` on set-returning functions
//! - type synonyms folded (`int4` is `integer`)
//!
//! Bodies in `sql` and `plpgsql` are compared token by token; bodies in other
//! languages keep their layout since indentation can be significant there.

mod body;
mod types;

use std::fmt;

use crate::error::ParseError;
use crate::parser::identifier_utils::display_identifier;
use crate::parser::routine_parser::{
    NullInputBehavior, ParallelSafety, ParameterMode, ParsedRoutine, ReturnsClause, RoutineBody,
    RoutineOption, RoutineParameter, RoutineTokenParser, SetValue, Volatility,
};
use crate::parser::{PostgresGrammar, RoutineGrammar};
use crate::util::{normalize_whitespace, strip_terminating_semicolon};

pub use body::canonical_tokens;
pub use types::canonical_type;

/// Canonical text of a routine definition; equal forms mean equal routines
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedForm(String);

impl NormalizedForm {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Routine normalizer over an injected grammar
#[derive(Debug, Clone, Default)]
pub struct Normalizer<G = PostgresGrammar> {
    grammar: G,
}

impl Normalizer<PostgresGrammar> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<G: RoutineGrammar> Normalizer<G> {
    pub fn with_grammar(grammar: G) -> Self {
        Self { grammar }
    }

    /// Normalize `raw_definition` (everything after the signature)
    pub fn normalize(
        &self,
        raw_definition: &str,
        signature: &str,
        is_procedure: bool,
    ) -> Result<NormalizedForm, ParseError> {
        let keyword = if is_procedure { "PROCEDURE" } else { "FUNCTION" };
        let sql = format!(
            "CREATE {keyword} {signature} {}",
            strip_terminating_semicolon(raw_definition)
        );
        let routine = self.grammar.parse_routine(&sql)?;
        if routine.is_procedure != is_procedure {
            return Err(ParseError::new(format!(
                "grammar returned a {} for a {}",
                routine_word(routine.is_procedure),
                routine_word(is_procedure)
            )));
        }
        self.serialize(&routine).map(NormalizedForm)
    }

    fn serialize(&self, routine: &ParsedRoutine) -> Result<String, ParseError> {
        let mut parts = vec![
            routine_word(routine.is_procedure).to_string(),
            format!(
                "{}({})",
                display_identifier(&routine.name),
                routine
                    .parameters
                    .iter()
                    .map(canonical_parameter)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        ];

        let set_returning = match &routine.returns {
            Some(ReturnsClause::Type { setof, data_type }) => {
                let prefix = if *setof { "setof " } else { "" };
                parts.push(format!("returns {prefix}{}", canonical_type(data_type, true)));
                *setof
            }
            Some(ReturnsClause::Table(columns)) => {
                let columns = columns
                    .iter()
                    .map(|(name, ty)| format!("{} {}", display_identifier(name), canonical_type(ty, true)))
                    .collect::<Vec<_>>()
                    .join(", ");
                parts.push(format!("returns table({columns})"));
                true
            }
            None => false,
        };

        let language = match (find_language(&routine.options), &routine.body) {
            (Some(lang), _) => lang.to_string(),
            (None, Some(RoutineBody::Standard(_))) => "sql".to_string(),
            (None, _) => return Err(ParseError::new("no language specified")),
        };
        parts.push(format!("language {language}"));

        let options = &routine.options;
        if options.iter().any(|o| matches!(o, RoutineOption::Window)) {
            parts.push("window".to_string());
        }
        for option in options {
            match option {
                RoutineOption::Volatility(Volatility::Immutable) => parts.push("immutable".into()),
                RoutineOption::Volatility(Volatility::Stable) => parts.push("stable".into()),
                _ => {}
            }
        }
        if options.contains(&RoutineOption::Leakproof(true)) {
            parts.push("leakproof".to_string());
        }
        if options.iter().any(|o| {
            matches!(
                o,
                RoutineOption::NullInput(
                    NullInputBehavior::Strict | NullInputBehavior::ReturnsNullOnNullInput
                )
            )
        }) {
            parts.push("returns null on null input".to_string());
        }
        if options
            .iter()
            .any(|o| matches!(o, RoutineOption::Security { definer: true, .. }))
        {
            parts.push("security definer".to_string());
        }
        for option in options {
            match option {
                RoutineOption::Parallel(ParallelSafety::Safe) => parts.push("parallel safe".into()),
                RoutineOption::Parallel(ParallelSafety::Restricted) => {
                    parts.push("parallel restricted".into())
                }
                _ => {}
            }
        }
        let default_cost = if language == "c" || language == "internal" {
            1.0
        } else {
            100.0
        };
        if let Some(cost) = options.iter().find_map(|o| match o {
            RoutineOption::Cost(cost) => Some(cost),
            _ => None,
        }) {
            let value = parse_number(cost)?;
            if value != default_cost {
                parts.push(format!("cost {value}"));
            }
        }
        if let Some(rows) = options.iter().find_map(|o| match o {
            RoutineOption::Rows(rows) => Some(rows),
            _ => None,
        }) {
            let value = parse_number(rows)?;
            if !(set_returning && value == 1000.0) {
                parts.push(format!("rows {value}"));
            }
        }
        for option in options {
            if let RoutineOption::Support(func) = option {
                parts.push(format!("support {}", canonical_tokens(func)));
            }
        }

        let mut settings: Vec<(&str, String)> = options
            .iter()
            .filter_map(|o| match o {
                RoutineOption::Set { name, value } => Some((name.as_str(), canonical_set_value(value))),
                _ => None,
            })
            .collect();
        settings.sort();
        for (name, value) in settings {
            parts.push(format!("set {name} {value}"));
        }

        for option in options {
            if let RoutineOption::Transform(types) = option {
                parts.push(format!("transform {}", canonical_tokens(types)));
            }
        }

        match &routine.body {
            Some(RoutineBody::Quoted(text)) => {
                parts.push(format!("as {}", self.canonical_body(text, &language)));
            }
            Some(RoutineBody::ObjectFile { file, symbol }) => {
                parts.push(format!("as '{file}', '{symbol}'"));
            }
            Some(RoutineBody::Standard(tokens)) => parts.push(canonical_tokens(tokens)),
            None => return Err(ParseError::new("no function body specified")),
        }

        Ok(parts.join(" "))
    }

    fn canonical_body(&self, text: &str, language: &str) -> String {
        if language != "sql" && language != "plpgsql" {
            return format!("'{}'", body::canonical_layout(text).replace('\'', "''"));
        }
        match self.grammar.tokenize(text) {
            Ok(tokens) => format!("$$ {} $$", canonical_tokens(&tokens)),
            // unterminated literal inside a quoted body; compare the text itself
            Err(_) => format!("'{}'", normalize_whitespace(text).replace('\'', "''")),
        }
    }
}

fn routine_word(is_procedure: bool) -> &'static str {
    if is_procedure {
        "procedure"
    } else {
        "function"
    }
}

fn find_language(options: &[RoutineOption]) -> Option<&str> {
    options.iter().find_map(|o| match o {
        RoutineOption::Language(lang) => Some(lang.as_str()),
        _ => None,
    })
}

fn parse_number(text: &str) -> Result<f64, ParseError> {
    text.parse::<f64>()
        .map_err(|_| ParseError::new(format!("invalid number '{text}'")))
}

fn canonical_parameter(param: &RoutineParameter) -> String {
    let mut out = String::new();
    if param.mode != ParameterMode::In {
        out.push_str(param.mode.as_str());
        out.push(' ');
    }
    if let Some(name) = &param.name {
        out.push_str(&display_identifier(name));
        out.push(' ');
    }
    out.push_str(&canonical_type(&param.data_type, true));
    if let Some(default) = &param.default {
        out.push_str(" default ");
        out.push_str(&canonical_tokens(default));
    }
    out
}

fn canonical_set_value(value: &SetValue) -> String {
    match value {
        SetValue::FromCurrent => "from current".to_string(),
        SetValue::Values(values) => format!(
            "= {}",
            values
                .iter()
                .map(|v| canonical_tokens(v).replace("- ", "-"))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// Identity signature of a routine: `name(input types)`.
///
/// OUT arguments, argument names, defaults and type modifiers are dropped and
/// synonyms folded, matching how PostgreSQL identifies the routine. A
/// signature that does not parse is used whitespace-normalized.
pub fn signature_identity(signature: &str) -> String {
    let parsed = RoutineTokenParser::new(signature).and_then(|mut p| p.parse_signature());
    match parsed {
        Ok((name, parameters)) => format!(
            "{}({})",
            display_identifier(&name),
            parameters
                .iter()
                .filter(|p| p.mode.is_input())
                .map(|p| canonical_type(&p.data_type, false))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Err(_) => normalize_whitespace(signature),
    }
}
