//! Reversible escaping of paths for line-oriented sidecar files.
//!
//! Paths containing `\` or a newline are written with `\` → `\\` and newline → `\n`, and the
//! whole line is prefixed with a single `\` (the `md5sum` convention). Unescaped paths never
//! contain a backslash, so a leading backslash always marks an escaped line.

use std::sync::LazyLock;

use regex::Regex;

/// `<32 hex digits><space>[<space>|*]<path>`. Single-space and binary-mode (`*`) lines are accepted.
static HASH_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9a-fA-F]{32}) [ *]?(.*)$").expect("valid regex"));

pub fn needs_escape(path: &str) -> bool {
    path.contains('\\') || path.contains('\n')
}

pub fn escape(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 2);
    for c in path.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse of [`escape`]. Returns `None` on a dangling or unknown escape sequence.
pub fn unescape(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '\\' => out.push('\\'),
            'n' => out.push('\n'),
            _ => return None,
        }
    }
    Some(out)
}

/// `<digest>  <path>\n`, escaped when needed.
pub fn encode_hash_line(digest: &str, path: &str) -> String {
    if needs_escape(path) {
        format!("\\{digest}  {}\n", escape(path))
    } else {
        format!("{digest}  {path}\n")
    }
}

/// Parse one hash line (trailing newline optional) into `(digest, path)`.
pub fn decode_hash_line(line: &str) -> Option<(String, String)> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let (escaped, body) = match line.strip_prefix('\\') {
        Some(rest) => (true, rest),
        None => (false, line),
    };
    let caps = HASH_LINE.captures(body)?;
    let digest = caps.get(1)?.as_str().to_ascii_lowercase();
    let raw_path = caps.get(2)?.as_str();
    let path = if escaped {
        unescape(raw_path)?
    } else {
        raw_path.to_string()
    };
    Some((digest, path))
}

/// One path-listing line, escaped like hash lines.
pub fn encode_path_line(path: &str) -> String {
    if needs_escape(path) {
        format!("\\{}\n", escape(path))
    } else {
        format!("{path}\n")
    }
}

pub fn decode_path_line(line: &str) -> Option<String> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    match line.strip_prefix('\\') {
        Some(rest) => unescape(rest),
        None => Some(line.to_string()),
    }
}
