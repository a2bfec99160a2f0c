//! Glob matching for repository scope patterns.

use regex::Regex;

/// Pattern that matches every repository.
pub const DEFAULT_INCLUDE_PATTERN: &str = "*";

/// Check whether `name` matches a glob `pattern`.
///
/// `*` matches any run of characters and `?` exactly one character. Every
/// other character matches literally and the whole name must match.
pub fn matches_pattern(name: &str, pattern: &str) -> bool {
    if pattern == DEFAULT_INCLUDE_PATTERN {
        return true;
    }

    match Regex::new(&glob_to_regex(pattern)) {
        Ok(regex) => regex.is_match(name),
        Err(err) => {
            log::debug!("ignoring invalid scope pattern {pattern:?}: {err}");
            false
        }
    }
}

/// Decide whether a repository is in scope. Exclusions take precedence.
pub fn should_include_repo(name: &str, include: &[String], exclude: &[String]) -> bool {
    if exclude.iter().any(|pattern| matches_pattern(name, pattern)) {
        return false;
    }
    include.iter().any(|pattern| matches_pattern(name, pattern))
}

fn glob_to_regex(pattern: &str) -> String {
    let mut expression = String::with_capacity(pattern.len() + 2);
    expression.push('^');
    let mut buffer = [0u8; 4];
    for ch in pattern.chars() {
        match ch {
            '*' => expression.push_str(".*"),
            '?' => expression.push('.'),
            _ => expression.push_str(&regex::escape(ch.encode_utf8(&mut buffer))),
        }
    }
    expression.push('$');
    expression
}
