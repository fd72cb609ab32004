//! Dot/bracket path parsing and lookup.
//!
//! Paths look like `user.name`, `users[0].email` or `row["a.b"].c`. Quoted
//! bracket keys let a field name contain dots.

use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathToken {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathError {
    pub message: String,
}

impl PathError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PathError {}

pub fn parse_path(path: &str) -> Result<Vec<PathToken>, PathError> {
    if path.is_empty() {
        return Err(PathError::new("path is empty"));
    }

    let chars: Vec<char> = path.chars().collect();
    let mut tokens = Vec::new();
    let mut key = String::new();
    // True right after a `]`, where only `.`, `[` or end of input may follow.
    let mut after_bracket = false;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '.' => {
                if key.is_empty() && !after_bracket {
                    return Err(PathError::new(format!("empty segment in path '{}'", path)));
                }
                if !key.is_empty() {
                    tokens.push(PathToken::Key(std::mem::take(&mut key)));
                }
                after_bracket = false;
                i += 1;
                if i == chars.len() {
                    return Err(PathError::new(format!("path '{}' ends with '.'", path)));
                }
            }
            '[' => {
                if !key.is_empty() {
                    tokens.push(PathToken::Key(std::mem::take(&mut key)));
                }
                let (token, next) = parse_bracket(&chars, i + 1, path)?;
                tokens.push(token);
                after_bracket = true;
                i = next;
            }
            c => {
                if after_bracket {
                    return Err(PathError::new(format!(
                        "expected '.' or '[' after ']' in path '{}'",
                        path
                    )));
                }
                key.push(c);
                i += 1;
            }
        }
    }

    if !key.is_empty() {
        tokens.push(PathToken::Key(key));
    }
    Ok(tokens)
}

/// Parses the inside of `[...]` starting just after the `[`. Returns the token
/// and the position after the closing `]`.
fn parse_bracket(
    chars: &[char],
    start: usize,
    path: &str,
) -> Result<(PathToken, usize), PathError> {
    let unclosed = || PathError::new(format!("unclosed '[' in path '{}'", path));

    match chars.get(start) {
        Some(&quote) if quote == '"' || quote == '\'' => {
            let mut key = String::new();
            let mut i = start + 1;
            loop {
                match chars.get(i) {
                    None => return Err(unclosed()),
                    Some('\\') => {
                        let escaped = chars.get(i + 1).ok_or_else(unclosed)?;
                        key.push(*escaped);
                        i += 2;
                    }
                    Some(&c) if c == quote => break,
                    Some(&c) => {
                        key.push(c);
                        i += 1;
                    }
                }
            }
            if chars.get(i + 1) != Some(&']') {
                return Err(unclosed());
            }
            Ok((PathToken::Key(key), i + 2))
        }
        _ => {
            let mut digits = String::new();
            let mut i = start;
            loop {
                match chars.get(i) {
                    None => return Err(unclosed()),
                    Some(']') => break,
                    Some(&c) => {
                        digits.push(c);
                        i += 1;
                    }
                }
            }
            let index = digits.trim().parse::<usize>().map_err(|_| {
                PathError::new(format!("invalid index '{}' in path '{}'", digits, path))
            })?;
            Ok((PathToken::Index(index), i + 1))
        }
    }
}

/// Walks `tokens` from `value`. Any step that cannot be taken yields `None`.
pub fn get_path<'a>(value: &'a JsonValue, tokens: &[PathToken]) -> Option<&'a JsonValue> {
    let mut current = value;
    for token in tokens {
        current = match (token, current) {
            (PathToken::Key(key), JsonValue::Object(map)) => map.get(key)?,
            (PathToken::Key(key), JsonValue::Array(items)) => {
                let index = key.parse::<usize>().ok()?;
                items.get(index)?
            }
            (PathToken::Index(index), JsonValue::Array(items)) => items.get(*index)?,
            _ => return None,
        };
    }
    Some(current)
}
