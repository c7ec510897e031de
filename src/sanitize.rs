// src/sanitize.rs
// Markup-to-plain-text reduction for raw descriptions before they reach the
// oracle. Pure and total: malformed markup degrades to best-effort text.

use once_cell::sync::OnceCell;
use regex::Regex;

const DEFAULT_MAX_CHARS: usize = 1500;

fn re_tags() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap())
}

fn re_breaks() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?i)<(?:br\s*/?|/p|/li|/div|/h[1-6])>").unwrap())
}

fn re_ws() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn re_ws_inline() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"[ \t]+").unwrap())
}

fn re_blank_lines() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\n{2,}").unwrap())
}

#[derive(Debug, Clone, Copy)]
pub struct Sanitizer {
    max_chars: usize,
    keep_newlines: bool,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            keep_newlines: false,
        }
    }
}

impl Sanitizer {
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn keep_newlines(mut self, keep: bool) -> Self {
        self.keep_newlines = keep;
        self
    }

    /// Strip tags, decode entities, collapse whitespace, trim, cap length.
    pub fn sanitize(&self, raw: &str) -> String {
        let mut out = raw.to_string();
        if self.keep_newlines {
            out = re_breaks().replace_all(&out, "\n").to_string();
        }
        out = re_tags().replace_all(&out, " ").to_string();
        out = html_escape::decode_html_entities(&out).to_string();

        if self.keep_newlines {
            out = re_ws_inline().replace_all(&out, " ").to_string();
            out = re_blank_lines().replace_all(&out, "\n").to_string();
            out = out
                .lines()
                .map(str::trim)
                .collect::<Vec<_>>()
                .join("\n");
        } else {
            out = re_ws().replace_all(&out, " ").to_string();
        }
        out = out.trim().to_string();

        if out.chars().count() > self.max_chars {
            out = out.chars().take(self.max_chars).collect();
        }
        out
    }
}

/// Tag-strip only, for short inline fragments like anchor titles.
pub fn strip_tags(raw: &str) -> String {
    let no_tags = re_tags().replace_all(raw, " ");
    let decoded = html_escape::decode_html_entities(&no_tags);
    re_ws().replace_all(decoded.trim(), " ").to_string()
}
