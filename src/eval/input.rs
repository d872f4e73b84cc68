//! Test case input parsing
//!
//! A case input is either a list of keyword assignments
//! (`nums = [1, 2], target = 3`) or a single positional expression
//! (`[1, 2, 3]`). Values stay as source text; the harness evaluates them with
//! `ast.literal_eval` inside the sandbox.

/// Arguments for one call of the entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArgs {
    /// Call with no arguments
    None,
    /// `name = value` pairs, in input order
    Keyword(Vec<(String, String)>),
    /// One positional argument
    Positional(String),
}

/// Parse a case input into call arguments
pub fn parse_call_args(input: &str) -> CallArgs {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return CallArgs::None;
    }

    let pieces = split_top_level(trimmed);
    let keywords: Option<Vec<(String, String)>> = pieces
        .iter()
        .filter(|piece| !piece.trim().is_empty())
        .map(|piece| keyword_pair(piece))
        .collect();

    match keywords {
        Some(pairs) if !pairs.is_empty() => CallArgs::Keyword(pairs),
        _ => CallArgs::Positional(trimmed.to_string()),
    }
}

/// `name = value` with a Python identifier on the left
fn keyword_pair(piece: &str) -> Option<(String, String)> {
    let (name, value) = piece.split_once('=')?;
    if value.starts_with('=') {
        return None;
    }
    let name = name.trim();
    let value = value.trim();
    if !is_identifier(name) || value.is_empty() {
        return None;
    }
    Some((name.to_string(), value.to_string()))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Split on commas outside brackets and string literals
fn split_top_level(s: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth: usize = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                pieces.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(&s[start..]);
    pieces
}
