//! Graphviz helpers shared by the block graph and circuit renderers.

/// Escapes a string for use inside a quoted DOT label.
///
/// # Examples
///
/// ```rust
/// use bytecircuit::utils::escape_dot;
///
/// assert_eq!(escape_dot("lda.str \"x\""), "lda.str \\\"x\\\"");
/// ```
#[must_use]
pub fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "")
        .replace('<', "\\<")
        .replace('>', "\\>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_dot_plain() {
        assert_eq!(escape_dot("0004: add2 v1"), "0004: add2 v1");
    }

    #[test]
    fn test_escape_dot_special() {
        assert_eq!(escape_dot("a\\b"), "a\\\\b");
        assert_eq!(escape_dot("l1\r\nl2"), "l1\\nl2");
        assert_eq!(escape_dot("<entry>"), "\\<entry\\>");
    }
}
