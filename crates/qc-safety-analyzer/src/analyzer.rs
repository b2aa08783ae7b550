//! The analysis pass itself (§4.1).
//!
//! The analyzer never builds a real syntax tree — there is no C# front end
//! in this workspace — but it inspects source the way a linter would:
//! comments and string/char literals are stripped first so rule matching
//! only sees code, then a handful of regexes pick out the constructs §4.1
//! cares about (imports, constructions, method calls, bare keywords). This
//! is intentionally conservative: it only ever rejects, and a rejection
//! always names the offending construct.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::SafetyRejection;
use crate::rules::{
    ALLOWED_NAMESPACE_PREFIXES, FORBIDDEN_CLASSES, FORBIDDEN_KEYWORDS, FORBIDDEN_METHODS,
};

lazy_static! {
    static ref LINE_COMMENT: Regex = Regex::new(r"//[^\n]*").unwrap();
    static ref BLOCK_COMMENT: Regex = Regex::new(r"(?s)/\*.*?\*/").unwrap();
    static ref STRING_LITERAL: Regex = Regex::new(r#""(?:\\.|[^"\\])*""#).unwrap();
    static ref CHAR_LITERAL: Regex = Regex::new(r"'(?:\\.|[^'\\])*'").unwrap();
    static ref USING_DECL: Regex =
        Regex::new(r"(?m)^\s*using\s+(?:static\s+)?([A-Za-z_][A-Za-z0-9_.]*)\s*;").unwrap();
    static ref NEW_EXPR: Regex =
        Regex::new(r"\bnew\s+([A-Za-z_][A-Za-z0-9_.]*)\s*[(<]").unwrap();
    static ref METHOD_CALL: Regex =
        Regex::new(r"\.([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap();
    static ref UNSAFE_BLOCK: Regex = Regex::new(r"\bunsafe\b\s*\{").unwrap();
    static ref RAW_POINTER: Regex =
        Regex::new(r"[A-Za-z_][A-Za-z0-9_]*\s*\*\s*[A-Za-z_][A-Za-z0-9_]*\s*[=;,)]").unwrap();
    static ref KEYWORD_TOKEN: Regex = Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap();
}

/// Rejects `source` on the first violation found, in the order listed in
/// §4.1: imports, unsafe constructs, forbidden classes, forbidden methods,
/// forbidden keywords. Returns `Ok(())` iff none apply.
///
/// This function never executes `source`; it only inspects it as text.
pub fn analyze(source: &str) -> Result<(), SafetyRejection> {
    let stripped = strip_comments_and_literals(source);

    check_imports(&stripped)?;
    check_unsafe_constructs(&stripped)?;
    check_forbidden_classes(&stripped)?;
    check_forbidden_methods(&stripped)?;
    check_forbidden_keywords(&stripped)?;
    Ok(())
}

/// Blanks out comments and string/char literal bodies (replacing them with
/// spaces of the same length, so byte offsets used by later diagnostics
/// still line up with the original source) so rule matching never fires on
/// text that appears only inside a literal or a comment.
fn strip_comments_and_literals(source: &str) -> String {
    let mut blanked = source.to_string();
    for pattern in [&*BLOCK_COMMENT, &*LINE_COMMENT, &*STRING_LITERAL, &*CHAR_LITERAL] {
        blanked = blank_matches(&blanked, pattern);
    }
    blanked
}

fn blank_matches(text: &str, pattern: &Regex) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in pattern.find_iter(text) {
        out.push_str(&text[last..m.start()]);
        out.extend(m.as_str().chars().map(|c| if c == '\n' { '\n' } else { ' ' }));
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

fn check_imports(source: &str) -> Result<(), SafetyRejection> {
    for caps in USING_DECL.captures_iter(source) {
        let target = &caps[1];
        let allowed = ALLOWED_NAMESPACE_PREFIXES
            .iter()
            .any(|prefix| target == *prefix || target.starts_with(&format!("{prefix}.")));
        if !allowed {
            return Err(SafetyRejection::namespace(target));
        }
    }
    Ok(())
}

fn check_unsafe_constructs(source: &str) -> Result<(), SafetyRejection> {
    if UNSAFE_BLOCK.is_match(source) || RAW_POINTER.is_match(source) {
        return Err(SafetyRejection::unsafe_block());
    }
    Ok(())
}

fn check_forbidden_classes(source: &str) -> Result<(), SafetyRejection> {
    for caps in NEW_EXPR.captures_iter(source) {
        let type_name = &caps[1];
        if let Some(rule) = FORBIDDEN_CLASSES
            .iter()
            .find(|forbidden| type_name.contains(*forbidden))
        {
            return Err(SafetyRejection::forbidden_class(type_name, rule));
        }
    }
    Ok(())
}

fn check_forbidden_methods(source: &str) -> Result<(), SafetyRejection> {
    for caps in METHOD_CALL.captures_iter(source) {
        let call = &caps[1];
        if let Some(rule) = FORBIDDEN_METHODS
            .iter()
            .find(|forbidden| call.contains(*forbidden))
        {
            return Err(SafetyRejection::forbidden_method(call, rule));
        }
    }
    Ok(())
}

fn check_forbidden_keywords(source: &str) -> Result<(), SafetyRejection> {
    for m in KEYWORD_TOKEN.find_iter(source) {
        if let Some(keyword) = FORBIDDEN_KEYWORDS.iter().find(|kw| **kw == m.as_str()) {
            return Err(SafetyRejection::forbidden_keyword(keyword));
        }
    }
    Ok(())
}
