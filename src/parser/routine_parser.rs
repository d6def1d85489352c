//! Token-based CREATE FUNCTION / CREATE PROCEDURE parsing for PostgreSQL
//!
//! ## Supported Syntax
//!
//! ```sql
//! CREATE [OR REPLACE] { FUNCTION | PROCEDURE } [schema.]name ( [ [mode] [name] type [ { DEFAULT | = } expr ] [, ...] ] )
//!     [ RETURNS [SETOF] type | RETURNS TABLE ( column type [, ...] ) ]
//!     { LANGUAGE lang | TRANSFORM ... | WINDOW
//!       | IMMUTABLE | STABLE | VOLATILE | [ NOT ] LEAKPROOF
//!       | CALLED ON NULL INPUT | RETURNS NULL ON NULL INPUT | STRICT
//!       | [ EXTERNAL ] SECURITY { INVOKER | DEFINER }
//!       | PARALLEL { UNSAFE | RESTRICTED | SAFE }
//!       | COST n | ROWS n | SUPPORT func
//!       | SET param { TO | = } value [, ...] | SET param FROM CURRENT
//!       | AS 'definition' | AS 'obj_file', 'link_symbol'
//!       | RETURN expr | BEGIN ATOMIC ... END } ...
//! ```
//!
//! The parser keeps the clauses in written order and records which spelling
//! was used; canonicalization is the normalizer's job.

use sqlparser::tokenizer::Token;

use super::identifier_utils::fold_word;
use super::token_parser_base::TokenParser;
use crate::error::ParseError;

/// Result of parsing a CREATE FUNCTION / CREATE PROCEDURE statement
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRoutine {
    pub is_procedure: bool,
    pub or_replace: bool,
    /// Folded schema, if the name was qualified
    pub schema: Option<String>,
    /// Folded routine name
    pub name: String,
    pub parameters: Vec<RoutineParameter>,
    pub returns: Option<ReturnsClause>,
    /// Options in the order they were written
    pub options: Vec<RoutineOption>,
    pub body: Option<RoutineBody>,
}

/// Argument mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterMode {
    #[default]
    In,
    Out,
    InOut,
    Variadic,
}

impl ParameterMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterMode::In => "in",
            ParameterMode::Out => "out",
            ParameterMode::InOut => "inout",
            ParameterMode::Variadic => "variadic",
        }
    }

    /// Whether the argument is part of the routine's call signature
    pub fn is_input(self) -> bool {
        !matches!(self, ParameterMode::Out)
    }
}

/// A parameter extracted from a routine signature
#[derive(Debug, Clone, PartialEq)]
pub struct RoutineParameter {
    pub mode: ParameterMode,
    /// Folded parameter name
    pub name: Option<String>,
    /// Significant tokens of the data type, as written
    pub data_type: Vec<Token>,
    /// Significant tokens of the default expression
    pub default: Option<Vec<Token>>,
}

/// RETURNS clause of a function
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnsClause {
    Type { setof: bool, data_type: Vec<Token> },
    Table(Vec<(String, Vec<Token>)>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Volatility {
    Immutable,
    Stable,
    Volatile,
}

/// Null-input behavior, recording the spelling used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullInputBehavior {
    CalledOnNullInput,
    ReturnsNullOnNullInput,
    /// Shorthand for `RETURNS NULL ON NULL INPUT`
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParallelSafety {
    Unsafe,
    Restricted,
    Safe,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SetValue {
    Values(Vec<Vec<Token>>),
    FromCurrent,
}

/// A single routine option clause
#[derive(Debug, Clone, PartialEq)]
pub enum RoutineOption {
    Language(String),
    Transform(Vec<Token>),
    Window,
    Volatility(Volatility),
    Leakproof(bool),
    NullInput(NullInputBehavior),
    Security { definer: bool, external: bool },
    Parallel(ParallelSafety),
    Cost(String),
    Rows(String),
    Support(Vec<Token>),
    Set { name: String, value: SetValue },
}

impl RoutineOption {
    /// Options sharing a category conflict with each other (`SET` never does)
    pub fn category(&self) -> Option<&'static str> {
        match self {
            RoutineOption::Language(_) => Some("LANGUAGE"),
            RoutineOption::Transform(_) => Some("TRANSFORM"),
            RoutineOption::Window => Some("WINDOW"),
            RoutineOption::Volatility(_) => Some("volatility"),
            RoutineOption::Leakproof(_) => Some("LEAKPROOF"),
            RoutineOption::NullInput(_) => Some("null input behavior"),
            RoutineOption::Security { .. } => Some("SECURITY"),
            RoutineOption::Parallel(_) => Some("PARALLEL"),
            RoutineOption::Cost(_) => Some("COST"),
            RoutineOption::Rows(_) => Some("ROWS"),
            RoutineOption::Support(_) => Some("SUPPORT"),
            RoutineOption::Set { .. } => None,
        }
    }
}

/// Routine body
#[derive(Debug, Clone, PartialEq)]
pub enum RoutineBody {
    /// `AS '...'` or `AS $tag$...$tag$`; holds the string content
    Quoted(String),
    /// `AS 'obj_file', 'link_symbol'`
    ObjectFile { file: String, symbol: String },
    /// SQL-standard body (`RETURN expr` or `BEGIN ATOMIC ... END`)
    Standard(Vec<Token>),
}

/// Words that begin a routine option; a RETURNS type or TRANSFORM list ends
/// at the first of these at parenthesis depth zero.
const OPTION_WORDS: &[&str] = &[
    "LANGUAGE", "TRANSFORM", "WINDOW", "IMMUTABLE", "STABLE", "VOLATILE", "NOT", "LEAKPROOF",
    "CALLED", "RETURNS", "STRICT", "EXTERNAL", "SECURITY", "PARALLEL", "COST", "ROWS", "SUPPORT",
    "SET", "AS", "RETURN", "BEGIN",
];

/// Multi-word type names that must not be mistaken for `name type`.
const MULTIWORD_TYPES: &[&[&str]] = &[
    &["double", "precision"],
    &["character", "varying"],
    &["char", "varying"],
    &["bit", "varying"],
    &["national", "character", "varying"],
    &["national", "character"],
    &["national", "char"],
    &["timestamp", "with", "time", "zone"],
    &["timestamp", "without", "time", "zone"],
    &["time", "with", "time", "zone"],
    &["time", "without", "time", "zone"],
];

/// Token-based routine definition parser
pub struct RoutineTokenParser {
    base: TokenParser,
}

impl RoutineTokenParser {
    /// Create a new parser for a routine definition string
    pub fn new(sql: &str) -> Result<Self, ParseError> {
        Ok(Self {
            base: TokenParser::new(sql)?,
        })
    }

    /// Parse a complete CREATE FUNCTION / CREATE PROCEDURE statement
    pub fn parse_create_routine(&mut self) -> Result<ParsedRoutine, ParseError> {
        self.base.skip_whitespace();
        self.base.expect_word_ci("CREATE")?;
        self.base.skip_whitespace();

        let or_replace = if self.base.consume_word_ci("OR") {
            self.base.skip_whitespace();
            self.base.expect_word_ci("REPLACE")?;
            self.base.skip_whitespace();
            true
        } else {
            false
        };

        let is_procedure = if self.base.consume_word_ci("FUNCTION") {
            false
        } else if self.base.consume_word_ci("PROCEDURE") {
            true
        } else {
            return Err(self.base.error("expected FUNCTION or PROCEDURE"));
        };
        self.base.skip_whitespace();

        let (schema, name, _) = self.base.parse_qualified_name()?;
        self.base.skip_whitespace();
        let parameters = parse_parameter_list(self.base.consume_parenthesized()?)?;
        self.base.skip_whitespace();

        let returns = if !is_procedure && self.check_returns_type() {
            self.base.advance();
            self.base.skip_whitespace();
            Some(self.parse_returns_clause()?)
        } else {
            None
        };

        let (options, body) = self.parse_options_and_body()?;

        Ok(ParsedRoutine {
            is_procedure,
            or_replace,
            schema,
            name,
            parameters,
            returns,
            options,
            body,
        })
    }

    /// Parse a bare signature such as `f(a int, b text DEFAULT 'x')`
    pub fn parse_signature(&mut self) -> Result<(String, Vec<RoutineParameter>), ParseError> {
        self.base.skip_whitespace();
        let (_, name, _) = self.base.parse_qualified_name()?;
        self.base.skip_whitespace();
        let parameters = parse_parameter_list(self.base.consume_parenthesized()?)?;
        self.base.skip_whitespace();
        if !self.base.is_at_end() {
            return Err(self.base.error("unexpected text after signature"));
        }
        Ok((name, parameters))
    }

    /// `RETURNS` that introduces a type rather than `RETURNS NULL ON NULL INPUT`
    fn check_returns_type(&self) -> bool {
        self.base.check_word_ci("RETURNS")
            && !matches!(
                self.base.peek_significant(),
                Some(Token::Word(w)) if w.quote_style.is_none() && w.value.eq_ignore_ascii_case("NULL")
            )
    }

    fn check_option_word(&self) -> bool {
        OPTION_WORDS.iter().any(|w| self.base.check_word_ci(w))
    }

    /// Parse the return type; position is just after RETURNS
    fn parse_returns_clause(&mut self) -> Result<ReturnsClause, ParseError> {
        if self.base.check_word_ci("TABLE")
            && matches!(self.base.peek_significant(), Some(Token::LParen))
        {
            self.base.advance();
            self.base.skip_whitespace();
            let inner = self.base.consume_parenthesized()?;
            let mut columns = Vec::new();
            for column in split_top_level(&inner) {
                match column.split_first() {
                    Some((Token::Word(w), data_type)) if !data_type.is_empty() => {
                        columns.push((fold_word(w), data_type.to_vec()));
                    }
                    _ => return Err(ParseError::new("malformed RETURNS TABLE column")),
                }
            }
            return Ok(ReturnsClause::Table(columns));
        }

        let setof = self.base.consume_word_ci("SETOF");
        self.base.skip_whitespace();
        let data_type = self.collect_until_option()?;
        if data_type.is_empty() {
            return Err(self.base.error("expected return type"));
        }
        Ok(ReturnsClause::Type { setof, data_type })
    }

    /// Collect significant tokens until an option word at depth zero, `;` or end
    fn collect_until_option(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        let mut depth = 0usize;
        while !self.base.is_at_end() {
            if depth == 0 && (self.check_option_word() || self.base.check_token(&Token::SemiColon)) {
                break;
            }
            match self.base.current_token() {
                Some(Token::Whitespace(_)) => {}
                Some(token) => {
                    match token {
                        Token::LParen => depth += 1,
                        Token::RParen => {
                            depth = depth
                                .checked_sub(1)
                                .ok_or_else(|| self.base.error("unbalanced parentheses"))?;
                        }
                        _ => {}
                    }
                    tokens.push(token.clone());
                }
                None => break,
            }
            self.base.advance();
        }
        Ok(tokens)
    }

    /// Collect every remaining significant token, dropping a terminating `;`
    fn collect_rest(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(token) = self.base.current_token() {
            if !matches!(token, Token::Whitespace(_) | Token::EOF) {
                tokens.push(token.clone());
            }
            self.base.advance();
        }
        if matches!(tokens.last(), Some(Token::SemiColon)) {
            tokens.pop();
        }
        tokens
    }

    fn parse_options_and_body(
        &mut self,
    ) -> Result<(Vec<RoutineOption>, Option<RoutineBody>), ParseError> {
        let mut options: Vec<RoutineOption> = Vec::new();
        let mut body = None;

        loop {
            self.base.skip_whitespace();
            if self.base.is_at_end() {
                break;
            }
            if self.base.check_token(&Token::SemiColon) {
                self.base.advance();
                self.base.skip_whitespace();
                if !self.base.is_at_end() {
                    return Err(self.base.error("unexpected text after statement"));
                }
                break;
            }

            if self.base.check_word_ci("AS") {
                self.base.advance();
                self.base.skip_whitespace();
                let parsed = self.parse_quoted_body()?;
                set_body(&mut body, parsed, &self.base)?;
                continue;
            }
            if self.base.check_word_ci("RETURN") {
                let tokens = self.collect_rest();
                set_body(&mut body, RoutineBody::Standard(tokens), &self.base)?;
                continue;
            }
            if self.base.check_word_ci("BEGIN") {
                if !matches!(
                    self.base.peek_significant(),
                    Some(Token::Word(w)) if w.value.eq_ignore_ascii_case("ATOMIC")
                ) {
                    return Err(self.base.error("expected BEGIN ATOMIC"));
                }
                let tokens = self.collect_rest();
                set_body(&mut body, RoutineBody::Standard(tokens), &self.base)?;
                continue;
            }

            let option = self.parse_option()?;
            if let Some(category) = option.category() {
                if options.iter().any(|o| o.category() == Some(category)) {
                    return Err(ParseError::new(format!(
                        "conflicting or redundant options: {category}"
                    )));
                }
            }
            options.push(option);
        }

        Ok((options, body))
    }

    fn parse_option(&mut self) -> Result<RoutineOption, ParseError> {
        let word = match self.base.current_token() {
            Some(Token::Word(w)) if w.quote_style.is_none() => w.value.to_uppercase(),
            _ => return Err(self.base.error("expected routine option")),
        };
        self.base.advance();
        self.base.skip_whitespace();

        let option = match word.as_str() {
            "LANGUAGE" => {
                let lang = match self.base.current_token() {
                    Some(Token::Word(w)) => w.value.to_lowercase(),
                    Some(Token::SingleQuotedString(s)) => s.to_lowercase(),
                    _ => return Err(self.base.error("expected language name")),
                };
                self.base.advance();
                RoutineOption::Language(lang)
            }
            "TRANSFORM" => RoutineOption::Transform(self.collect_until_option()?),
            "WINDOW" => RoutineOption::Window,
            "IMMUTABLE" => RoutineOption::Volatility(Volatility::Immutable),
            "STABLE" => RoutineOption::Volatility(Volatility::Stable),
            "VOLATILE" => RoutineOption::Volatility(Volatility::Volatile),
            "LEAKPROOF" => RoutineOption::Leakproof(true),
            "NOT" => {
                self.base.expect_word_ci("LEAKPROOF")?;
                RoutineOption::Leakproof(false)
            }
            "CALLED" => {
                self.expect_words(&["ON", "NULL", "INPUT"])?;
                RoutineOption::NullInput(NullInputBehavior::CalledOnNullInput)
            }
            "RETURNS" => {
                self.expect_words(&["NULL", "ON", "NULL", "INPUT"])?;
                RoutineOption::NullInput(NullInputBehavior::ReturnsNullOnNullInput)
            }
            "STRICT" => RoutineOption::NullInput(NullInputBehavior::Strict),
            "EXTERNAL" => {
                self.base.expect_word_ci("SECURITY")?;
                self.base.skip_whitespace();
                RoutineOption::Security {
                    definer: self.parse_security_kind()?,
                    external: true,
                }
            }
            "SECURITY" => RoutineOption::Security {
                definer: self.parse_security_kind()?,
                external: false,
            },
            "PARALLEL" => {
                let safety = if self.base.consume_word_ci("UNSAFE") {
                    ParallelSafety::Unsafe
                } else if self.base.consume_word_ci("RESTRICTED") {
                    ParallelSafety::Restricted
                } else if self.base.consume_word_ci("SAFE") {
                    ParallelSafety::Safe
                } else {
                    return Err(self.base.error("expected UNSAFE, RESTRICTED or SAFE"));
                };
                RoutineOption::Parallel(safety)
            }
            "COST" => RoutineOption::Cost(self.parse_number()?),
            "ROWS" => RoutineOption::Rows(self.parse_number()?),
            "SUPPORT" => RoutineOption::Support(self.collect_until_option()?),
            "SET" => self.parse_set_option()?,
            other => {
                return Err(ParseError::new(format!(
                    "unsupported routine option {other} at line {}",
                    self.base.current_line()
                )))
            }
        };
        Ok(option)
    }

    fn expect_words(&mut self, words: &[&str]) -> Result<(), ParseError> {
        for word in words {
            self.base.skip_whitespace();
            self.base.expect_word_ci(word)?;
        }
        Ok(())
    }

    fn parse_security_kind(&mut self) -> Result<bool, ParseError> {
        if self.base.consume_word_ci("DEFINER") {
            Ok(true)
        } else if self.base.consume_word_ci("INVOKER") {
            Ok(false)
        } else {
            Err(self.base.error("expected INVOKER or DEFINER"))
        }
    }

    fn parse_number(&mut self) -> Result<String, ParseError> {
        match self.base.current_token() {
            Some(Token::Number(n, _)) => {
                let n = n.clone();
                self.base.advance();
                Ok(n)
            }
            _ => Err(self.base.error("expected number")),
        }
    }

    /// `SET name { TO | = } value [, ...]` or `SET name FROM CURRENT`
    fn parse_set_option(&mut self) -> Result<RoutineOption, ParseError> {
        let mut name = self.base.parse_identifier()?;
        while self.base.check_token(&Token::Period) {
            self.base.advance();
            name.push('.');
            name.push_str(&self.base.parse_identifier()?);
        }
        self.base.skip_whitespace();

        if self.base.consume_word_ci("FROM") {
            self.base.skip_whitespace();
            self.base.expect_word_ci("CURRENT")?;
            return Ok(RoutineOption::Set {
                name,
                value: SetValue::FromCurrent,
            });
        }

        if !self.base.consume_word_ci("TO") {
            self.base.expect_token(&Token::Eq)?;
        }

        let mut values = Vec::new();
        loop {
            self.base.skip_whitespace();
            let mut item = Vec::new();
            if self.base.check_token(&Token::Minus) {
                item.push(Token::Minus);
                self.base.advance();
            }
            match self.base.current_token() {
                Some(
                    token @ (Token::Word(_)
                    | Token::Number(_, _)
                    | Token::SingleQuotedString(_)
                    | Token::EscapedStringLiteral(_)),
                ) => {
                    item.push(token.clone());
                    self.base.advance();
                }
                _ => return Err(self.base.error("expected configuration value")),
            }
            values.push(item);

            let save = self.base.pos();
            self.base.skip_whitespace();
            if self.base.check_token(&Token::Comma) {
                self.base.advance();
            } else {
                self.base.set_pos(save);
                break;
            }
        }

        Ok(RoutineOption::Set {
            name,
            value: SetValue::Values(values),
        })
    }

    /// Parse the string(s) after AS
    fn parse_quoted_body(&mut self) -> Result<RoutineBody, ParseError> {
        let first = self.parse_string_literal()?;
        let save = self.base.pos();
        self.base.skip_whitespace();
        if self.base.check_token(&Token::Comma) {
            self.base.advance();
            self.base.skip_whitespace();
            let symbol = self.parse_string_literal()?;
            return Ok(RoutineBody::ObjectFile {
                file: first,
                symbol,
            });
        }
        self.base.set_pos(save);
        Ok(RoutineBody::Quoted(first))
    }

    fn parse_string_literal(&mut self) -> Result<String, ParseError> {
        let value = match self.base.current_token() {
            Some(Token::SingleQuotedString(s))
            | Some(Token::EscapedStringLiteral(s))
            | Some(Token::NationalStringLiteral(s)) => s.clone(),
            Some(Token::DollarQuotedString(d)) => d.value.clone(),
            _ => return Err(self.base.error("expected string literal")),
        };
        self.base.advance();
        Ok(value)
    }
}

fn set_body(
    slot: &mut Option<RoutineBody>,
    body: RoutineBody,
    base: &TokenParser,
) -> Result<(), ParseError> {
    if slot.is_some() {
        return Err(base.error("duplicate function body specified"));
    }
    *slot = Some(body);
    Ok(())
}

/// Split a token list on commas at parenthesis/bracket depth zero
pub fn split_top_level(tokens: &[Token]) -> Vec<Vec<Token>> {
    let mut parts = Vec::new();
    let mut current = Vec::new();
    let mut depth = 0usize;
    for token in tokens {
        match token {
            Token::LParen | Token::LBracket => depth += 1,
            Token::RParen | Token::RBracket => depth = depth.saturating_sub(1),
            Token::Comma if depth == 0 => {
                parts.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(token.clone());
    }
    if !current.is_empty() || !parts.is_empty() {
        parts.push(current);
    }
    parts
}

/// Parse the inner tokens of a parameter list
fn parse_parameter_list(tokens: Vec<Token>) -> Result<Vec<RoutineParameter>, ParseError> {
    split_top_level(&tokens)
        .into_iter()
        .map(|part| parse_parameter(&part))
        .collect()
}

fn parse_parameter(tokens: &[Token]) -> Result<RoutineParameter, ParseError> {
    let (decl, default) = match find_default(tokens) {
        Some(idx) => {
            let expr = tokens[idx + 1..].to_vec();
            if expr.is_empty() {
                return Err(ParseError::new("missing default expression"));
            }
            (&tokens[..idx], Some(expr))
        }
        None => (tokens, None),
    };

    let (mode, rest) = match decl.split_first() {
        Some((Token::Word(w), rest)) if w.quote_style.is_none() && !rest.is_empty() => {
            match w.value.to_uppercase().as_str() {
                "IN" => (ParameterMode::In, rest),
                "OUT" => (ParameterMode::Out, rest),
                "INOUT" => (ParameterMode::InOut, rest),
                "VARIADIC" => (ParameterMode::Variadic, rest),
                _ => (ParameterMode::In, decl),
            }
        }
        _ => (ParameterMode::In, decl),
    };

    if rest.is_empty() {
        return Err(ParseError::new("empty parameter declaration"));
    }

    if is_type_only(rest) {
        return Ok(RoutineParameter {
            mode,
            name: None,
            data_type: rest.to_vec(),
            default,
        });
    }

    match rest.split_first() {
        Some((Token::Word(w), data_type)) => Ok(RoutineParameter {
            mode,
            name: Some(fold_word(w)),
            data_type: data_type.to_vec(),
            default,
        }),
        _ => Err(ParseError::new(format!(
            "malformed parameter declaration '{}'",
            rest.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
        ))),
    }
}

/// Index of `DEFAULT` or `=` at depth zero
fn find_default(tokens: &[Token]) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::LParen | Token::LBracket => depth += 1,
            Token::RParen | Token::RBracket => depth = depth.saturating_sub(1),
            Token::Eq if depth == 0 => return Some(i),
            Token::Word(w)
                if depth == 0 && w.quote_style.is_none() && w.value.eq_ignore_ascii_case("DEFAULT") =>
            {
                return Some(i)
            }
            _ => {}
        }
    }
    None
}

/// Whether a declaration without mode is a bare type (no parameter name).
fn is_type_only(tokens: &[Token]) -> bool {
    if tokens.len() == 1 {
        return true;
    }

    // `schema.type`, `type(10)`, `type[]`, `tbl.col%TYPE`
    if matches!(
        tokens.get(1),
        Some(Token::Period | Token::LParen | Token::LBracket | Token::Mod)
    ) {
        return true;
    }

    let words: Vec<&str> = tokens
        .iter()
        .map_while(|t| match t {
            Token::Word(w) if w.quote_style.is_none() => Some(w.value.as_str()),
            _ => None,
        })
        .collect();

    MULTIWORD_TYPES.iter().any(|phrase| {
        words.len() >= phrase.len()
            && phrase
                .iter()
                .zip(&words)
                .all(|(p, w)| w.eq_ignore_ascii_case(p))
            && tokens[phrase.len()..]
                .iter()
                .all(|t| !matches!(t, Token::Word(_)) || is_array_word(t))
    })
}

fn is_array_word(token: &Token) -> bool {
    matches!(token, Token::Word(w) if w.quote_style.is_none() && w.value.eq_ignore_ascii_case("ARRAY"))
}
