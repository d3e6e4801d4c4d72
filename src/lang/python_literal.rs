//! Python string literal decoding and docstring cleaning.

/// A decoded string literal and the prefix flags that matter for docstrings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLiteral {
    /// Literal value after quote removal and escape decoding
    pub value: String,
    /// `f`-prefixed (interpolated)
    pub formatted: bool,
    /// `b`-prefixed (bytes)
    pub bytes: bool,
}

impl DecodedLiteral {
    /// Only plain and raw text literals qualify as docstrings.
    pub fn is_docstring_candidate(&self) -> bool {
        !self.formatted && !self.bytes
    }
}

/// Decode one literal token such as `r"""text"""` or `'a\tb'`.
///
/// Returns `None` when the text is not shaped like a string literal.
pub fn decode_literal(raw: &str) -> Option<DecodedLiteral> {
    let prefix_len = raw
        .char_indices()
        .find(|(_, c)| *c == '"' || *c == '\'')
        .map(|(idx, _)| idx)?;
    let prefix = raw[..prefix_len].to_ascii_lowercase();
    if !prefix.chars().all(|c| matches!(c, 'r' | 'u' | 'b' | 'f')) {
        return None;
    }

    let rest = &raw[prefix_len..];
    let quote = ["\"\"\"", "'''", "\"", "'"]
        .into_iter()
        .find(|q| rest.starts_with(q) && rest.len() >= q.len() * 2 && rest.ends_with(q))?;
    let inner = &rest[quote.len()..rest.len() - quote.len()];

    let value = if prefix.contains('r') {
        inner.to_string()
    } else {
        decode_escapes(inner)
    };

    Some(DecodedLiteral {
        value,
        formatted: prefix.contains('f'),
        bytes: prefix.contains('b'),
    })
}

/// Decode backslash escapes the way the Python tokenizer does for text literals.
///
/// Unknown escapes are kept verbatim, including the backslash.
pub fn decode_escapes(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            '\n' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0C}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0B}'),
            '0'..='7' => {
                let mut code = next.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(digit) => {
                            code = code * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
            }
            'x' => push_hex_escape(&mut out, &mut chars, 'x', 2),
            'u' => push_hex_escape(&mut out, &mut chars, 'u', 4),
            'U' => push_hex_escape(&mut out, &mut chars, 'U', 8),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    out
}

fn push_hex_escape(
    out: &mut String,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    marker: char,
    width: usize,
) {
    let mut digits = String::with_capacity(width);
    while digits.len() < width {
        match chars.peek() {
            Some(d) if d.is_ascii_hexdigit() => {
                digits.push(*d);
                chars.next();
            }
            _ => break,
        }
    }

    let decoded = (digits.len() == width)
        .then(|| u32::from_str_radix(&digits, 16).ok())
        .flatten()
        .and_then(char::from_u32);
    match decoded {
        Some(ch) => out.push(ch),
        None => {
            out.push('\\');
            out.push(marker);
            out.push_str(&digits);
        }
    }
}

/// Expand tabs to the next multiple of `tab_size`, restarting at each newline.
pub fn expand_tabs(text: &str, tab_size: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut column = 0;
    for c in text.chars() {
        match c {
            '\t' => {
                let pad = tab_size - (column % tab_size);
                out.extend(std::iter::repeat(' ').take(pad));
                column += pad;
            }
            '\n' | '\r' => {
                out.push(c);
                column = 0;
            }
            _ => {
                out.push(c);
                column += 1;
            }
        }
    }
    out
}

/// Clean docstring indentation.
///
/// Tabs are expanded, the first line is left-stripped, the common leading
/// indentation of the remaining non-blank lines is removed and leading and
/// trailing blank lines are dropped.
pub fn clean_docstring(raw: &str) -> String {
    let expanded = expand_tabs(raw, 8);
    let lines: Vec<&str> = expanded.lines().collect();
    if lines.is_empty() {
        return String::new();
    }

    let margin = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min();

    let mut cleaned: Vec<String> = Vec::with_capacity(lines.len());
    cleaned.push(lines[0].trim_start().to_string());
    for line in &lines[1..] {
        let trimmed = match margin {
            Some(margin) if line.len() >= margin && line.is_char_boundary(margin) => {
                line[margin..].trim_end().to_string()
            }
            _ => line.trim().to_string(),
        };
        cleaned.push(trimmed);
    }

    while cleaned.last().is_some_and(|line| line.trim().is_empty()) {
        cleaned.pop();
    }
    let leading_blank = cleaned
        .iter()
        .take_while(|line| line.trim().is_empty())
        .count();

    cleaned[leading_blank..].join("\n")
}

/// Collapse runs of whitespace (including newlines) into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
