//! Structural safety checks for user-supplied regex patterns.
//!
//! User merchant patterns are matched against every imported row, so a
//! pattern with catastrophic-backtracking shape must never reach
//! compilation. The checks here are string-structural, one nesting level
//! deep: a quantified group whose own body carries a quantifier, a
//! quantified alternation with overlapping alternatives, or a quantified
//! backreference. The underlying `regex` engine is linear-time (and rejects
//! backreferences outright), so these checks are about refusing
//! configuration that is dangerous *as written* and would blow up if ever
//! pasted into a backtracking engine, rather than about protecting this
//! process alone.

use thiserror::Error;

/// Longest accepted pattern.
const MAX_PATTERN_LEN: usize = 100;

/// Why a pattern was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternRejection {
    /// Longer than [`MAX_PATTERN_LEN`] characters.
    #[error("pattern is {len} characters long (limit {MAX_PATTERN_LEN})")]
    TooLong {
        /// Actual length.
        len: usize,
    },

    /// A quantified group whose body is itself quantified, e.g. `(a+)+`.
    #[error("nested quantifier: a quantified group contains a quantifier")]
    NestedQuantifier,

    /// A quantified alternation whose alternatives overlap, e.g. `(a|ab)+`.
    #[error("quantified alternation with overlapping alternatives")]
    OverlappingAlternation,

    /// A backreference directly followed by a quantifier, e.g. `(.+)\1+`.
    #[error("quantified backreference")]
    QuantifiedBackreference,
}

/// Check one pattern; `Ok(())` means it is safe to compile.
///
/// # Errors
///
/// The first [`PatternRejection`] rule the pattern trips.
pub fn validate(pattern: &str) -> Result<(), PatternRejection> {
    let len = pattern.chars().count();
    if len > MAX_PATTERN_LEN {
        return Err(PatternRejection::TooLong { len });
    }
    if has_quantified_backreference(pattern) {
        return Err(PatternRejection::QuantifiedBackreference);
    }

    let chars: Vec<char> = pattern.chars().collect();
    for (open, close) in group_spans(&chars) {
        if !is_quantified(&chars, close) {
            continue;
        }
        let body = strip_group_flags(&chars[open + 1..close]);
        if body_is_alternation(body) {
            if alternation_overlaps(body) {
                return Err(PatternRejection::OverlappingAlternation);
            }
            if body_has_quantifier(body) {
                // e.g. `(a+|b)+`: same blowup shape as a nested quantifier.
                return Err(PatternRejection::NestedQuantifier);
            }
        } else if body_has_quantifier(body) {
            return Err(PatternRejection::NestedQuantifier);
        }
    }
    Ok(())
}

/// `(start, end)` index pairs of every balanced group, any depth.
fn group_spans(chars: &[char]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut stack = Vec::new();
    let mut in_class = false;
    let mut escaped = false;
    for (i, &c) in chars.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => stack.push(i),
            ')' if !in_class => {
                if let Some(open) = stack.pop() {
                    spans.push((open, i));
                }
            }
            _ => {}
        }
    }
    spans
}

/// Whether the token ending at `close` is followed by `+`, `*`, `?` with a
/// repeat potential, or a `{...}` range.
fn is_quantified(chars: &[char], close: usize) -> bool {
    matches!(chars.get(close + 1), Some('+' | '*' | '{'))
}

/// Drop a leading `?:` / `?i:`-style flag prefix from a group body.
fn strip_group_flags(body: &[char]) -> &[char] {
    if body.first() == Some(&'?') {
        if let Some(colon) = body.iter().position(|&c| c == ':') {
            return &body[colon + 1..];
        }
    }
    body
}

/// Whether the body carries a quantifier at any position outside a
/// character class (one-level check; nested group bodies are not entered
/// separately, their quantifiers still count as the outer body's).
fn body_has_quantifier(body: &[char]) -> bool {
    let mut in_class = false;
    let mut escaped = false;
    for &c in body {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '+' | '*' | '{' if !in_class => return true,
            _ => {}
        }
    }
    false
}

fn body_is_alternation(body: &[char]) -> bool {
    top_level_alternatives(body).len() > 1
}

/// Split a group body on `|` at depth zero.
fn top_level_alternatives(body: &[char]) -> Vec<String> {
    let mut alternatives = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_class = false;
    let mut escaped = false;
    for &c in body {
        if escaped {
            escaped = false;
            current.push(c);
            continue;
        }
        match c {
            '\\' => escaped = true,
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => depth += 1,
            ')' if !in_class => depth = depth.saturating_sub(1),
            '|' if !in_class && depth == 0 => {
                alternatives.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    alternatives.push(current);
    alternatives
}

/// Overlap rules for a quantified alternation: identical alternatives, one
/// a prefix or suffix of another, a bare wildcard alternative, or a common
/// prefix longer than half the shorter alternative.
fn alternation_overlaps(body: &[char]) -> bool {
    let alternatives = top_level_alternatives(body);
    for alt in &alternatives {
        if matches!(alt.as_str(), "." | ".*" | ".+") {
            return true;
        }
    }
    for (i, a) in alternatives.iter().enumerate() {
        for b in alternatives.iter().skip(i + 1) {
            if a == b || a.starts_with(b.as_str()) || b.starts_with(a.as_str())
                || a.ends_with(b.as_str()) || b.ends_with(a.as_str())
            {
                return true;
            }
            let common = a
                .chars()
                .zip(b.chars())
                .take_while(|(x, y)| x == y)
                .count();
            let shorter = a.chars().count().min(b.chars().count());
            if shorter > 0 && common * 2 > shorter {
                return true;
            }
        }
    }
    false
}

/// `\1`-style backreference directly followed by a quantifier.
fn has_quantified_backreference(pattern: &str) -> bool {
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i + 1 < chars.len() {
        if chars[i] == '\\' && chars[i + 1].is_ascii_digit() {
            let mut j = i + 2;
            while j < chars.len() && chars[j].is_ascii_digit() {
                j += 1;
            }
            if matches!(chars.get(j), Some('+' | '*' | '?' | '{')) {
                return true;
            }
            i = j;
        } else if chars[i] == '\\' {
            i += 2;
        } else {
            i += 1;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_patterns_accepted() {
        assert!(validate("AMAZON").is_ok());
        assert!(validate("^WHOLE ?FOODS").is_ok());
        assert!(validate("(UBER|LYFT) TRIP").is_ok());
        assert!(validate("PAYPAL \\*[A-Z]+").is_ok());
        assert!(validate("CHECK #?[0-9]{3,6}").is_ok());
    }

    #[test]
    fn test_too_long_rejected() {
        let long = "A".repeat(101);
        assert_eq!(
            validate(&long),
            Err(PatternRejection::TooLong { len: 101 })
        );
        assert!(validate(&"A".repeat(100)).is_ok());
    }

    #[test]
    fn test_nested_quantifiers_rejected() {
        for p in ["(a+)+", "(a*)+", "(a+){3}", "(.+)+", "(a{2,})+", "(?:x*)*"] {
            assert_eq!(validate(p), Err(PatternRejection::NestedQuantifier), "{p}");
        }
    }

    #[test]
    fn test_overlapping_alternation_rejected() {
        for p in ["(a|ab)+", "(ab|b)+", "(.|x)+", "(abcd|abce)+"] {
            assert_eq!(
                validate(p),
                Err(PatternRejection::OverlappingAlternation),
                "{p}"
            );
        }
    }

    #[test]
    fn test_disjoint_alternation_accepted() {
        assert!(validate("(cat|dog)+").is_ok());
        assert!(validate("(foo|barbaz)*").is_ok());
    }

    #[test]
    fn test_quantified_backreference_rejected() {
        assert_eq!(
            validate(r"(.+)\1+"),
            Err(PatternRejection::QuantifiedBackreference)
        );
        assert_eq!(
            validate(r"(ab)\1{2,}"),
            Err(PatternRejection::QuantifiedBackreference)
        );
    }

    #[test]
    fn test_unquantified_group_with_inner_quantifier_accepted() {
        assert!(validate("(a+)b").is_ok());
        assert!(validate("GROCER(Y|IES)").is_ok());
    }

    #[test]
    fn test_class_quantifiers_do_not_count_as_nested() {
        // The + is inside a character class, not a quantifier.
        assert!(validate("([+*])x").is_ok());
    }
}
