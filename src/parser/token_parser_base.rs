//! Base token parser providing common helper methods for PostgreSQL parsing.
//!
//! The specialized parsers (`RoutineTokenParser`, the statement splitter and
//! the `from_sql` constructors) compose a `TokenParser` and delegate token
//! navigation to it:
//!
//! ```ignore
//! pub struct RoutineTokenParser {
//!     base: TokenParser,
//! }
//!
//! impl RoutineTokenParser {
//!     pub fn parse_create_routine(&mut self) -> Result<ParsedRoutine, ParseError> {
//!         self.base.skip_whitespace();
//!         self.base.expect_word_ci("CREATE")?;
//!         // ...
//!     }
//! }
//! ```
//!
//! Comments are whitespace tokens to the tokenizer, so `skip_whitespace` also
//! skips `--` and `/* */` comments.

use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::tokenizer::{Token, TokenWithSpan, Tokenizer};

use super::identifier_utils::fold_word;
use crate::error::ParseError;

/// Tokenize PostgreSQL text, keeping whitespace and comment tokens.
pub fn tokenize(sql: &str) -> Result<Vec<TokenWithSpan>, ParseError> {
    let dialect = PostgreSqlDialect {};
    Ok(Tokenizer::new(&dialect, sql).tokenize_with_location()?)
}

/// Byte offset in `sql` where each token starts.
///
/// Token spans carry 1-based line and character columns; statement and
/// signature text is sliced from the source with these offsets so literals
/// keep exactly the escaping they were written with.
pub fn token_offsets(sql: &str, tokens: &[TokenWithSpan]) -> Vec<usize> {
    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(sql.match_indices('\n').map(|(i, _)| i + 1))
        .collect();
    tokens
        .iter()
        .map(|t| {
            let line = (t.span.start.line as usize).saturating_sub(1);
            let column = (t.span.start.column as usize).saturating_sub(1);
            match line_starts.get(line) {
                Some(&start) => sql[start..]
                    .char_indices()
                    .nth(column)
                    .map_or(sql.len(), |(i, _)| start + i),
                None => sql.len(),
            }
        })
        .collect()
}

/// Tokenize PostgreSQL text and drop whitespace, comments and EOF.
pub fn significant_tokens(sql: &str) -> Result<Vec<Token>, ParseError> {
    Ok(tokenize(sql)?
        .into_iter()
        .map(|t| t.token)
        .filter(|t| !matches!(t, Token::Whitespace(_) | Token::EOF))
        .collect())
}

/// Base token parser with common helper methods for PostgreSQL parsing.
pub struct TokenParser {
    source: String,
    tokens: Vec<TokenWithSpan>,
    offsets: Vec<usize>,
    pos: usize,
}

impl TokenParser {
    /// Create a new TokenParser from a SQL string.
    pub fn new(sql: &str) -> Result<Self, ParseError> {
        let tokens = tokenize(sql)?;
        let offsets = token_offsets(sql, &tokens);
        Ok(Self {
            source: sql.to_string(),
            tokens,
            offsets,
            pos: 0,
        })
    }

    // ========================================================================
    // Position and state
    // ========================================================================

    /// Check if at end of tokens.
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len() || matches!(self.tokens[self.pos].token, Token::EOF)
    }

    /// Get current position in token stream.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Set current position in token stream.
    #[inline]
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Number of tokens in the stream.
    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    // ========================================================================
    // Token access
    // ========================================================================

    /// Get current token without consuming.
    #[inline]
    pub fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Line of the current token, for error messages.
    pub fn current_line(&self) -> u64 {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(0, |t| t.span.start.line)
    }

    /// Peek at the next significant token after the current one.
    pub fn peek_significant(&self) -> Option<&Token> {
        self.tokens[self.pos.saturating_add(1).min(self.tokens.len())..]
            .iter()
            .map(|t| &t.token)
            .find(|t| !matches!(t, Token::Whitespace(_)))
    }

    /// Advance to next token.
    #[inline]
    pub fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    // ========================================================================
    // Whitespace handling
    // ========================================================================

    /// Skip whitespace and comment tokens.
    pub fn skip_whitespace(&mut self) {
        while let Some(Token::Whitespace(_)) = self.current_token() {
            self.advance();
        }
    }

    // ========================================================================
    // Token type checks
    // ========================================================================

    /// Check if current token is an unquoted word matching (case-insensitive).
    ///
    /// PostgreSQL routine options (`IMMUTABLE`, `LEAKPROOF`, `PARALLEL`, ...)
    /// are matched this way rather than through `Keyword`, since several of
    /// them are not sqlparser keywords.
    #[inline]
    pub fn check_word_ci(&self, word: &str) -> bool {
        matches!(
            self.current_token(),
            Some(Token::Word(w)) if w.quote_style.is_none() && w.value.eq_ignore_ascii_case(word)
        )
    }

    /// Check if current token matches a specific token type (by discriminant).
    #[inline]
    pub fn check_token(&self, expected: &Token) -> bool {
        self.current_token()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    // ========================================================================
    // Expect methods (check and advance)
    // ========================================================================

    /// Expect a specific word (case-insensitive), advancing if found.
    pub fn expect_word_ci(&mut self, word: &str) -> Result<(), ParseError> {
        if self.check_word_ci(word) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected {}", word.to_uppercase())))
        }
    }

    /// Expect a specific token type, advancing if found.
    pub fn expect_token(&mut self, expected: &Token) -> Result<(), ParseError> {
        if self.check_token(expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", expected)))
        }
    }

    /// Consume a word if it matches, returning whether it did.
    pub fn consume_word_ci(&mut self, word: &str) -> bool {
        if self.check_word_ci(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Build a parse error pointing at the current token.
    pub fn error(&self, message: impl AsRef<str>) -> ParseError {
        let found = self
            .current_token()
            .map_or_else(|| "end of input".to_string(), |t| format!("'{}'", t));
        ParseError::new(format!(
            "{} at line {}, found {}",
            message.as_ref(),
            self.current_line(),
            found
        ))
    }

    // ========================================================================
    // Identifier parsing
    // ========================================================================

    /// Parse an identifier and return it folded (unquoted lower-cased, quoted verbatim).
    pub fn parse_identifier(&mut self) -> Result<String, ParseError> {
        match self.current_token() {
            Some(Token::Word(w)) => {
                let name = fold_word(w);
                self.advance();
                Ok(name)
            }
            _ => Err(self.error("expected identifier")),
        }
    }

    /// Parse `schema.name` or `name`.
    ///
    /// Returns `(schema, name, name_pos)` where `name_pos` is the token index of
    /// the final name part, so callers can slice the original text from there.
    pub fn parse_qualified_name(&mut self) -> Result<(Option<String>, String, usize), ParseError> {
        let first_pos = self.pos;
        let first = self.parse_identifier()?;
        let after_first = self.pos;
        self.skip_whitespace();

        if self.check_token(&Token::Period) {
            self.advance();
            self.skip_whitespace();
            let name_pos = self.pos;
            let second = self.parse_identifier()?;
            self.skip_whitespace();
            if self.check_token(&Token::Period) {
                return Err(self.error("cross-database references are not supported"));
            }
            Ok((Some(first), second, name_pos))
        } else {
            self.set_pos(after_first);
            Ok((None, first, first_pos))
        }
    }

    // ========================================================================
    // Groups and slices
    // ========================================================================

    /// Skip a parenthesized group, handling nested parentheses.
    ///
    /// Position must be at the opening parenthesis; afterwards it is just past
    /// the matching closing one.
    pub fn skip_parenthesized(&mut self) -> Result<(), ParseError> {
        self.expect_token(&Token::LParen)?;
        let mut depth = 1usize;
        while !self.is_at_end() {
            match self.current_token() {
                Some(Token::LParen) => depth += 1,
                Some(Token::RParen) => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return Ok(());
                    }
                }
                _ => {}
            }
            self.advance();
        }
        Err(self.error("unbalanced parentheses"))
    }

    /// Consume a parenthesized group and return its inner significant tokens.
    pub fn consume_parenthesized(&mut self) -> Result<Vec<Token>, ParseError> {
        let start = self.pos;
        self.skip_parenthesized()?;
        Ok(self.tokens[start + 1..self.pos - 1]
            .iter()
            .map(|t| t.token.clone())
            .filter(|t| !matches!(t, Token::Whitespace(_)))
            .collect())
    }

    /// Source text covered by a range of tokens, whitespace included.
    pub fn tokens_to_string(&self, start_pos: usize, end_pos: usize) -> String {
        let offset = |pos: usize| {
            self.offsets
                .get(pos)
                .copied()
                .unwrap_or(self.source.len())
        };
        let start = offset(start_pos);
        let end = offset(end_pos).max(start);
        self.source[start..end].to_string()
    }
}
