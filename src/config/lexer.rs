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

use std::iter::Peekable;
use std::str::Chars;
use std::sync::Arc;

use crate::error::{ConfigError, Location};

/// A single lexical token of a configuration block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub file: Arc<str>,
    /// Line the token starts on (1-indexed)
    pub line: usize,
    /// Whether the token was written between quotes
    pub quoted: bool,
}

impl Token {
    pub fn new(file: &Arc<str>, line: usize, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            file: Arc::clone(file),
            line,
            quoted: false,
        }
    }

    /// Line the token ends on; quoted tokens may span lines.
    pub(crate) fn last_line(&self) -> usize {
        self.line + self.text.matches('\n').count()
    }

    pub(crate) fn is_open_brace(&self) -> bool {
        !self.quoted && self.text == "{"
    }

    pub(crate) fn is_close_brace(&self) -> bool {
        !self.quoted && self.text == "}"
    }

    pub(crate) fn location(&self) -> Location {
        Location {
            file: Arc::clone(&self.file),
            line: self.line,
        }
    }
}

/// Splits configuration text into tokens.
///
/// # Process Description
///
/// 1. Whitespace separates tokens; every newline advances the line counter.
/// 2. `#` at the start of a token comments out the rest of the line.
/// 3. `"..."` quotes may contain whitespace and the escapes `\"` and `\\`.
/// 4. `` `...` `` quotes are taken verbatim.
/// 5. Unquoted braces must balance.
pub fn tokenize(file: &str, input: &str) -> Result<Vec<Token>, ConfigError> {
    let file: Arc<str> = Arc::from(file);
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    let mut line = 1;
    let mut word = String::new();
    let mut word_line = line;

    while let Some(ch) = chars.next() {
        if ch.is_whitespace() {
            if !word.is_empty() {
                tokens.push(Token::new(&file, word_line, std::mem::take(&mut word)));
            }
            if ch == '\n' {
                line += 1;
            }
            continue;
        }

        if word.is_empty() {
            match ch {
                '#' => {
                    while chars.peek().is_some_and(|c| *c != '\n') {
                        chars.next();
                    }
                    continue;
                }
                '"' | '`' => {
                    let start = line;
                    let text = read_quoted(&mut chars, ch, &mut line).ok_or_else(|| {
                        ConfigError::Syntax {
                            location: Location {
                                file: Arc::clone(&file),
                                line: start,
                            },
                            message: "unterminated quoted string".to_string(),
                        }
                    })?;
                    let mut token = Token::new(&file, start, text);
                    token.quoted = true;
                    tokens.push(token);
                    continue;
                }
                _ => word_line = line,
            }
        }
        word.push(ch);
    }
    if !word.is_empty() {
        tokens.push(Token::new(&file, word_line, word));
    }

    check_braces(&tokens)?;
    Ok(tokens)
}

/// Reads up to the closing `delim`. Returns `None` at end of input.
fn read_quoted(chars: &mut Peekable<Chars<'_>>, delim: char, line: &mut usize) -> Option<String> {
    let mut text = String::new();
    loop {
        let ch = chars.next()?;
        match ch {
            c if c == delim => return Some(text),
            '\\' if delim == '"' => match chars.peek() {
                Some('"') | Some('\\') => text.push(chars.next()?),
                _ => text.push('\\'),
            },
            '\n' => {
                *line += 1;
                text.push('\n');
            }
            c => text.push(c),
        }
    }
}

fn check_braces(tokens: &[Token]) -> Result<(), ConfigError> {
    let mut open = Vec::new();
    for token in tokens {
        if token.is_open_brace() {
            open.push(token);
        } else if token.is_close_brace() && open.pop().is_none() {
            return Err(ConfigError::Syntax {
                location: token.location(),
                message: "unexpected '}'".to_string(),
            });
        }
    }
    match open.pop() {
        Some(token) => Err(ConfigError::Syntax {
            location: token.location(),
            message: "unclosed block".to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_tokenize_words_and_lines() {
        let tokens = tokenize("Caddyfile", "transip alice /etc/key.pem {\n  debug_level 2\n}\n")
            .unwrap();
        assert_eq!(
            texts(&tokens),
            vec!["transip", "alice", "/etc/key.pem", "{", "debug_level", "2", "}"]
        );
        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 1, 1, 1, 2, 2, 3]);
        assert!(tokens[3].is_open_brace());
        assert_eq!(&*tokens[0].file, "Caddyfile");
    }

    #[test]
    fn test_tokenize_comments() {
        let tokens = tokenize("Caddyfile", "# leading\ntransip alice # trailing\nkey#not-a-comment").unwrap();
        assert_eq!(texts(&tokens), vec!["transip", "alice", "key#not-a-comment"]);
        assert_eq!(tokens[2].line, 3);
    }

    #[test]
    fn test_tokenize_quotes() {
        let tokens = tokenize("Caddyfile", r#"login "bob smith" "say \"hi\"" `raw \n` "{""#).unwrap();
        assert_eq!(texts(&tokens), vec!["login", "bob smith", "say \"hi\"", "raw \\n", "{"]);
        assert!(tokens[1].quoted);
        assert!(!tokens[4].is_open_brace());
    }

    #[test]
    fn test_quoted_token_spanning_lines() {
        let tokens = tokenize("Caddyfile", "private_key \"-----BEGIN\nKEY-----\" next").unwrap();
        assert_eq!(tokens[1].line, 1);
        assert_eq!(tokens[1].last_line(), 2);
        assert_eq!(tokens[2].line, 2);
    }

    #[test]
    fn test_unterminated_quote() {
        let err = tokenize("Caddyfile", "transip\nlogin \"bob").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { ref location, .. } if location.line == 2));
        assert!(err.to_string().contains("unterminated quoted string"));
    }

    #[test]
    fn test_unbalanced_braces() {
        let err = tokenize("Caddyfile", "transip {\n login bob\n").unwrap_err();
        assert!(err.to_string().contains("unclosed block"));

        let err = tokenize("Caddyfile", "transip\n}\n").unwrap_err();
        assert!(err.to_string().contains("unexpected '}'"));
    }
}
