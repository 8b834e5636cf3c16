//! Path expression normalizer.
//!
//! Rewrites a raw path expression into the `;`-delimited token string the
//! tracer walks. Computed-index `[(...)]` and filter `[?(...)]` sub-expressions
//! are swapped for `#N` placeholders first so their dots and brackets survive
//! the delimiter rewriting, and are put back verbatim at the end.
//!
//! ```
//! use jsonhand::jsonpath::normalize;
//!
//! assert_eq!(normalize("$.data[*].year"), "$;data;*;year");
//! assert_eq!(normalize("$..month"), "$;..;month");
//! assert_eq!(normalize("$.data[?(@.years==2018)]"), "$;data;?(@.years==2018)");
//! ```

/// Normalizes a raw path expression into its `;`-delimited token form.
pub fn normalize(expr: &str) -> String {
    let mut normalizer = Normalizer::default();
    let protected = normalizer.protect(expr);
    let delimited = rewrite_delimiters(&protected);
    let collapsed = collapse_descent(&delimited);
    let trimmed = strip_closers(&collapsed);
    normalizer.restore(&trimmed)
}

/// Holds the placeholder side table for one normalization.
#[derive(Debug, Default)]
struct Normalizer {
    placeholders: Vec<String>,
}

impl Normalizer {
    /// Replaces each parenthesized sub-expression with `#N`.
    ///
    /// Bracketed forms `[(…)]`, `[?(…)]` (or quoted `'(…)'`) end at the first
    /// `)` followed by `]` or `'` and become `[#N]`. Tokens of an already
    /// normalized expression (`;(…)`, `;?(…)`) end at the next top-level `;`.
    fn protect(&mut self, expr: &str) -> String {
        let bytes = expr.as_bytes();
        let mut out = String::with_capacity(expr.len());
        let mut copied = 0;
        let mut i = 0;

        while i < bytes.len() {
            let found = match bytes[i] {
                b'[' | b'\'' => bracketed_end(bytes, i + 1).map(|end| (end, end + 1)),
                b';' => token_end(bytes, i + 1).map(|end| (end, end)),
                _ => None,
            };
            let Some((inner_end, match_end)) = found else {
                i += 1;
                continue;
            };

            out.push_str(&expr[copied..i]);
            let n = self.placeholders.len();
            self.placeholders.push(expr[i + 1..inner_end].to_string());
            if bytes[i] == b';' {
                out.push_str(&format!(";#{}", n));
            } else {
                out.push_str(&format!("[#{}]", n));
            }
            i = match_end;
            copied = i;
        }

        out.push_str(&expr[copied..]);
        out
    }

    /// Substitutes every `#N` with its stored sub-expression.
    ///
    /// `#N` without a side-table entry is left untouched.
    fn restore(&self, text: &str) -> String {
        let bytes = text.as_bytes();
        let mut out = String::with_capacity(text.len());
        let mut copied = 0;
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] == b'#' {
                let digits = bytes[i + 1..]
                    .iter()
                    .take_while(|b| b.is_ascii_digit())
                    .count();
                let original = text[i + 1..i + 1 + digits]
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| self.placeholders.get(n));
                if let Some(original) = original {
                    out.push_str(&text[copied..i]);
                    out.push_str(original);
                    i += 1 + digits;
                    copied = i;
                    continue;
                }
            }
            i += 1;
        }

        out.push_str(&text[copied..]);
        out
    }
}

/// Matches `?(` … `)` followed by `]` or `'`, starting at `start`.
///
/// Returns the index one past the closing `)`.
fn bracketed_end(bytes: &[u8], start: usize) -> Option<usize> {
    let open = if bytes.get(start) == Some(&b'?') {
        start + 1
    } else {
        start
    };
    if bytes.get(open) != Some(&b'(') {
        return None;
    }

    let mut j = open + 1;
    while j < bytes.len() && bytes[j] != b'\n' {
        if bytes[j] == b')' && matches!(bytes.get(j + 1), Some(b']' | b'\'')) {
            return Some(j + 1);
        }
        j += 1;
    }
    None
}

/// Matches a whole `(…)` / `?(…)` token that runs to the next top-level `;`.
fn token_end(bytes: &[u8], start: usize) -> Option<usize> {
    let open = if bytes.get(start) == Some(&b'?') {
        start + 1
    } else {
        start
    };
    if bytes.get(open) != Some(&b'(') {
        return None;
    }

    let mut depth = 0usize;
    let mut j = open;
    while j < bytes.len() {
        match bytes[j] {
            b'(' => depth += 1,
            b')' => depth = depth.checked_sub(1)?,
            b';' if depth == 0 => break,
            _ => {}
        }
        j += 1;
    }
    (depth == 0 && bytes[j - 1] == b')').then_some(j)
}

/// Turns `.`/`'.'` (unless after `@`) and `[`/`['` into `;`.
///
/// An existing `;..;` is kept as is, so already normalized input passes
/// through unchanged.
fn rewrite_delimiters(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i..].starts_with(b";..;") {
            out.push_str(";..;");
            i += 4;
            continue;
        }

        let delimiter_len = match bytes[i] {
            b'\'' if bytes.get(i + 1) == Some(&b'.') => Some(2),
            b'.' if i == 0 || bytes[i - 1] != b'@' => Some(1),
            b'[' => Some(1),
            _ => None,
        };
        if let Some(len) = delimiter_len {
            i += len;
            if bytes.get(i) == Some(&b'\'') {
                i += 1;
            }
            out.push(';');
            continue;
        }

        let ch = text[i..].chars().next().unwrap_or_default();
        out.push(ch);
        i += ch.len_utf8().max(1);
    }

    out
}

/// Collapses the `;;` / `;;;` left by `..` into a single `;..;` marker.
fn collapse_descent(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    let mut rest = text;

    while let Some(pos) = rest.find(";;") {
        out.push_str(&rest[..pos]);
        out.push_str(";..;");
        let run = if rest[pos..].starts_with(";;;") { 3 } else { 2 };
        rest = &rest[pos + run..];
    }

    out.push_str(rest);
    out
}

/// Drops a trailing `;`, every `]` (with a quote before it) and a trailing quote.
fn strip_closers(text: &str) -> String {
    let bytes = text.as_bytes();
    let last = bytes.len().saturating_sub(1);
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b';' | b'\'' if i == last => i += 1,
            b'\'' if bytes.get(i + 1) == Some(&b']') => i += 2,
            b']' => i += 1,
            _ => {
                let ch = text[i..].chars().next().unwrap_or_default();
                out.push(ch);
                i += ch.len_utf8().max(1);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_only() {
        assert_eq!(normalize("$"), "$");
    }

    #[test]
    fn test_dot_children() {
        assert_eq!(normalize("$.store.book"), "$;store;book");
    }

    #[test]
    fn test_bracket_children() {
        assert_eq!(normalize("$['store']['book']"), "$;store;book");
        assert_eq!(normalize("$.store['book'][0]"), "$;store;book;0");
    }

    #[test]
    fn test_wildcards() {
        assert_eq!(normalize("$.data[*]"), "$;data;*");
        assert_eq!(normalize("$.data.*"), "$;data;*");
    }

    #[test]
    fn test_recursive_descent() {
        assert_eq!(normalize("$..month"), "$;..;month");
        assert_eq!(normalize("$.data..year"), "$;data;..;year");
        assert_eq!(normalize("$..*"), "$;..;*");
        assert_eq!(normalize("$..['b']"), "$;..;b");
        assert_eq!(normalize("$.."), "$;..");
    }

    #[test]
    fn test_slices_and_unions() {
        assert_eq!(normalize("$.data[1:2]"), "$;data;1:2");
        assert_eq!(normalize("$.data[-1:]"), "$;data;-1:");
        assert_eq!(normalize("$.data[::2]"), "$;data;::2");
        assert_eq!(normalize("$['a','b']"), "$;a','b");
        assert_eq!(normalize("$.data[0,2]"), "$;data;0,2");
    }

    #[test]
    fn test_expressions_are_protected() {
        assert_eq!(
            normalize("$.data[(@.length-1)]"),
            "$;data;(@.length-1)"
        );
        assert_eq!(
            normalize("$.data[?(@.a.b == 'x.y')].c"),
            "$;data;?(@.a.b == 'x.y');c"
        );
        assert_eq!(
            normalize("$.a[?(@.x)].b[?(@.y.z)]"),
            "$;a;?(@.x);b;?(@.y.z)"
        );
    }

    #[test]
    fn test_current_node_dot_is_not_a_delimiter() {
        assert_eq!(normalize("$.a@.b"), "$;a@.b");
    }

    #[test]
    fn test_key_enumeration_marker() {
        assert_eq!(normalize("$.data.!"), "$;data;!");
    }

    #[test]
    fn test_unknown_placeholder_is_kept() {
        assert_eq!(normalize("$.tags.#7"), "$;tags;#7");
    }

    #[test]
    fn test_idempotent_on_normalized_input() {
        for expr in [
            "$.data[*].year",
            "$..month",
            "$.data..year",
            "$.data[1:2]",
            "$['a','b']",
            "$.data[(@.length-1)]",
            "$.data[?(@.a.b==2018)].months[0]",
            "$",
        ] {
            let once = normalize(expr);
            assert_eq!(normalize(&once), once, "not idempotent for {}", expr);
        }
    }

    #[test]
    fn test_non_ascii_keys() {
        assert_eq!(normalize("$.données['clé']"), "$;données;clé");
    }
}
