//! Source wrapping.
//!
//! Turns a raw snippet into a compilable crate root. A snippet that already
//! declares functions is used verbatim under the prelude; anything else is the
//! body of the canonical `pub fn sort(arr: &mut [i32])`, with top-level helper
//! functions hoisted out behind it. Braces are never repaired: an unbalanced
//! snippet stays unbalanced and rustc reports it.

use syn::Item;

/// Crate-level boilerplate placed in front of every submission.
pub const PRELUDE: &str = "\
#![allow(dead_code, unused_imports, unused_mut, unused_variables, unused_assignments)]
#![allow(non_snake_case, clippy::all)]
#[allow(unused_imports)]
use std::collections::*;
";

/// Name and signature of the operation synthesised in body mode.
pub const CANONICAL_SIGNATURE: &str = "pub fn sort(arr: &mut [i32])";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    /// The snippet declared its own functions.
    Verbatim,
    /// The snippet was the body of the canonical `sort`.
    Body,
}

/// Compilable crate root derived from a submission.
#[derive(Debug, Clone)]
pub struct WrappedSource {
    pub text: String,
    pub mode: WrapMode,
}

/// Wrap `snippet`; always succeeds, validity is left to the compiler.
pub fn wrap(snippet: &str) -> WrappedSource {
    if declares_functions(snippet) {
        let mut text = String::with_capacity(PRELUDE.len() + snippet.len() + 1);
        text.push_str(PRELUDE);
        text.push('\n');
        text.push_str(snippet);
        if !snippet.ends_with('\n') {
            text.push('\n');
        }
        return WrappedSource {
            text,
            mode: WrapMode::Verbatim,
        };
    }

    let (statements, helpers) = split_body(snippet);
    let mut text = String::with_capacity(PRELUDE.len() + snippet.len() + 64);
    text.push_str(PRELUDE);
    text.push('\n');
    text.push_str(CANONICAL_SIGNATURE);
    text.push_str(" {\n");
    text.push_str(&statements);
    text.push_str("}\n");
    if !helpers.is_empty() {
        text.push('\n');
        text.push_str(&helpers);
    }

    WrappedSource {
        text,
        mode: WrapMode::Body,
    }
}

/// Shallow structural check: the snippet parses as items and one is a `fn`.
/// A snippet that does not parse still counts when every top-level line
/// belongs to a `fn` item (or is an import, attribute or comment), so a typo
/// inside a full declaration reaches rustc as written.
fn declares_functions(snippet: &str) -> bool {
    match syn::parse_file(snippet) {
        Ok(file) => file.items.iter().any(|item| matches!(item, Item::Fn(_))),
        Err(_) => {
            let (statements, helpers) = split_body(snippet);
            !helpers.is_empty() && statements.lines().all(is_item_preamble)
        }
    }
}

fn is_item_preamble(line: &str) -> bool {
    let line = line.trim();
    line.is_empty()
        || line.starts_with("//")
        || line.starts_with("#[")
        || line.starts_with("use ")
}

/// Separate top-level statements from helper `fn` items by brace depth.
fn split_body(snippet: &str) -> (String, String) {
    let mut statements = String::new();
    let mut helpers = String::new();
    let mut depth: i64 = 0;
    let mut in_helper = false;
    let mut helper_opened = false;

    for line in snippet.lines() {
        let delta = brace_delta(line);

        if !in_helper && depth == 0 && starts_fn_item(line) {
            in_helper = true;
            helper_opened = false;
        }

        depth += delta;
        if in_helper {
            helpers.push_str(line);
            helpers.push('\n');
            helper_opened |= line.contains('{');
            if helper_opened && depth <= 0 {
                in_helper = false;
            }
        } else {
            statements.push_str("    ");
            statements.push_str(line);
            statements.push('\n');
        }
    }

    (statements, helpers)
}

fn brace_delta(line: &str) -> i64 {
    line.chars().fold(0, |acc, c| match c {
        '{' => acc + 1,
        '}' => acc - 1,
        _ => acc,
    })
}

/// `[pub[(..)]] [const] [async] [unsafe] [extern "abi"] fn ident`
fn starts_fn_item(line: &str) -> bool {
    let mut tokens = line.split_whitespace();
    while let Some(token) = tokens.next() {
        let qualifier = token == "pub"
            || token.starts_with("pub(")
            || matches!(token, "const" | "async" | "unsafe" | "extern")
            || token.starts_with('"');
        if qualifier {
            continue;
        }
        if token == "fn" {
            return tokens
                .next()
                .and_then(|name| name.chars().next())
                .map(|c| c.is_alphabetic() || c == '_')
                .unwrap_or(false);
        }
        return false;
    }
    false
}
