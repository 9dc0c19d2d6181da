//! Configuration text tokenizer.
//!
//! Splits block-structured configuration text into ordered token lines.
//! The format is line oriented: one keyword plus its arguments per line,
//! `#` or `!` starting a comment, double quotes grouping a token that
//! contains whitespace. A trailing `{` opens a block; a line whose first
//! token is `}` closes the innermost one.

use crate::error::{ConfError, ConfResult};

/// One logical configuration line: a keyword followed by its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    tokens: Vec<String>,
    lineno: usize,
    opens_block: bool,
}

impl Line {
    /// Returns the keyword (first token) of this line.
    pub fn keyword(&self) -> &str {
        &self.tokens[0]
    }

    /// Returns the i-th token, counting the keyword as token 0.
    pub fn arg(&self, i: usize) -> Option<&str> {
        self.tokens.get(i).map(String::as_str)
    }

    /// True if this line ended with a block-open brace.
    pub fn opens_block(&self) -> bool {
        self.opens_block
    }

    /// True if this line closes the innermost block.
    pub fn closes_block(&self) -> bool {
        self.tokens[0] == "}"
    }

    /// 1-based source line number.
    pub fn lineno(&self) -> usize {
        self.lineno
    }
}

/// Splits one raw line into tokens.
///
/// Returns an empty vector for blank and comment-only lines.
fn tokenize_line(raw: &str, lineno: usize) -> ConfResult<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = raw.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '#' || c == '!' {
            break;
        } else if c == '"' {
            chars.next();
            let mut token = String::new();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some(c) => token.push(c),
                    None => return Err(ConfError::UnterminatedQuote { line: lineno }),
                }
            }
            tokens.push(token);
        } else {
            // Comments start at a token boundary only; a '#' or '!'
            // inside a token stays part of it.
            let mut token = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() || c == '"' {
                    break;
                }
                token.push(c);
                chars.next();
            }
            tokens.push(token);
        }
    }

    Ok(tokens)
}

/// Tokenizes configuration text into logical lines.
///
/// Blank lines and comments are dropped; a trailing `{` is folded into the
/// line's [`Line::opens_block`] flag rather than kept as a token, so
/// handlers only ever see the keyword and its arguments.
pub fn tokenize(input: &str) -> ConfResult<Vec<Line>> {
    let mut lines = Vec::new();

    for (idx, raw) in input.lines().enumerate() {
        let lineno = idx + 1;
        let mut tokens = tokenize_line(raw, lineno)?;
        if tokens.is_empty() {
            continue;
        }

        let opens_block = tokens.last().map(String::as_str) == Some("{");
        if opens_block {
            tokens.pop();
        }
        if tokens.is_empty() {
            // A bare "{" carries no keyword to dispatch on.
            continue;
        }

        lines.push(Line {
            tokens,
            lineno,
            opens_block,
        });
    }

    Ok(lines)
}
