// Copyright 2023 dns-provider-transip authors
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use std::sync::Arc;

use crate::config::lexer::{Token, tokenize};
use crate::error::{ConfigError, Location};

/// Cursor over the tokens of one or more configuration blocks.
///
/// Typical use by a module:
///
/// ```
/// use dns_provider_transip::config::Dispenser;
///
/// let mut d = Dispenser::parse("Caddyfile", "transip alice {\n  debug_level 2\n}").unwrap();
/// while d.next() {
///     while d.next_arg() { /* positional arguments */ }
///     let nesting = d.nesting();
///     while d.next_block(nesting) { /* sub-directive lines */ }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Dispenser {
    file: Arc<str>,
    tokens: Vec<Token>,
    cursor: Option<usize>,
    nesting: usize,
}

impl Dispenser {
    /// Creates a dispenser over already lexed tokens.
    pub fn new(file: &str, tokens: Vec<Token>) -> Self {
        Self {
            file: Arc::from(file),
            tokens,
            cursor: None,
            nesting: 0,
        }
    }

    /// Lexes `input` and creates a dispenser over the result.
    pub fn parse(file: &str, input: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(file, tokenize(file, input)?))
    }

    /// Loads the next token, wherever it is. Returns `false` at the end.
    pub fn next(&mut self) -> bool {
        let next = self.cursor.map_or(0, |c| c + 1);
        if next < self.tokens.len() {
            self.cursor = Some(next);
            true
        } else {
            false
        }
    }

    /// Loads the next token only if it is an argument on the current line.
    ///
    /// Unquoted braces are never arguments, so a block opening on the
    /// same line stops argument scanning.
    pub fn next_arg(&mut self) -> bool {
        if self.cursor.is_none() {
            return self.next();
        }
        match self.peek_on_same_line() {
            Some(token) if !token.is_open_brace() && !token.is_close_brace() => self.next(),
            _ => false,
        }
    }

    /// Current block depth.
    pub fn nesting(&self) -> usize {
        self.nesting
    }

    /// Advances to the next line inside the block that started at
    /// `initial_nesting`, entering the block first if the current line
    /// opens one.
    ///
    /// Returns `false` once the closing brace of the block is reached or if
    /// there is no block at all.
    pub fn next_block(&mut self, initial_nesting: usize) -> bool {
        if self.nesting > initial_nesting {
            if !self.next() {
                return false;
            }
            if self.current().is_some_and(Token::is_close_brace) {
                self.nesting -= 1;
                return false;
            }
            if self.current().is_some_and(Token::is_open_brace) {
                self.nesting += 1;
            }
            return self.nesting > initial_nesting;
        }

        if !self.peek_on_same_line().is_some_and(Token::is_open_brace) {
            return false;
        }
        // Step onto the brace, then onto the first line of the block.
        self.next();
        if !self.next() || self.current().is_some_and(Token::is_close_brace) {
            return false;
        }
        self.nesting += 1;
        true
    }

    /// Text of the current token; empty before the first token is loaded.
    pub fn val(&self) -> &str {
        self.current().map_or("", |t| t.text.as_str())
    }

    /// Line of the current token.
    pub fn line(&self) -> usize {
        self.current().map_or(0, |t| t.line)
    }

    /// Location of the current token, used in error messages.
    pub fn location(&self) -> Location {
        Location {
            file: Arc::clone(&self.file),
            line: self.line(),
        }
    }

    /// Rewinds to before the first token.
    pub fn reset(&mut self) {
        self.cursor = None;
        self.nesting = 0;
    }

    /// Error for a field assigned twice.
    pub fn already_set(&self, field: &'static str) -> ConfigError {
        ConfigError::AlreadySet {
            location: self.location(),
            field,
        }
    }

    /// Error for an unexpected argument after the current token.
    pub fn arg_err(&self) -> ConfigError {
        ConfigError::UnexpectedArgument {
            location: self.location(),
            after: self.val().to_string(),
        }
    }

    /// Error for a sub-directive the module does not know.
    pub fn unrecognized(&self) -> ConfigError {
        ConfigError::UnrecognizedSubdirective {
            location: self.location(),
            name: self.val().to_string(),
        }
    }

    /// Error for a required field that was never set.
    pub fn missing(&self, field: &'static str) -> ConfigError {
        ConfigError::MissingField {
            location: self.location(),
            field,
        }
    }

    fn current(&self) -> Option<&Token> {
        self.cursor.and_then(|c| self.tokens.get(c))
    }

    fn peek_on_same_line(&self) -> Option<&Token> {
        let current = self.current()?;
        let next = self.tokens.get(self.cursor? + 1)?;
        (next.file == current.file && next.line == current.last_line()).then_some(next)
    }
}
