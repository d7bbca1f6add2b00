use regex::Regex;
use unicode_normalization::UnicodeNormalization;

const BULLETS: &[char] = &[
    '•', '●', '◦', '▪', '▫', '·', '∙', '■', '□', '◆', '◇', '▶', '▸', '►', '–', '—', '\u{2023}',
    '\u{2043}', '\u{fe0e}',
];

/// Punctuation that never belongs to a technology name. `+ # . -` survive.
const SEPARATORS: &[char] = &[
    '|', '/', '\\', ';', ',', '(', ')', '{', '}', '[', ']', ':', '~', '^', '@', '*', '&', '!', '?',
    '"', '<', '>', '=',
];

pub fn normalize_whitespace(text: &str) -> String {
    text.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Inserts a space at every lowercase-to-uppercase boundary ("PowerBI" -> "Power BI").
pub fn split_camel_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut previous: Option<char> = None;
    for ch in text.chars() {
        if ch.is_ascii_uppercase() && previous.is_some_and(|p| p.is_ascii_lowercase()) {
            out.push(' ');
        }
        out.push(ch);
        previous = Some(ch);
    }
    out
}

/// Splits text into pieces of at most `size` characters.
pub fn chunk_chars(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size.max(1))
        .map(|piece| piece.iter().collect::<String>())
        .collect()
}

/// Cleans résumé/JD text (PDF output in particular) before skill matching.
pub struct SkillTextNormalizer {
    ellipsis: Regex,
}

impl SkillTextNormalizer {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            ellipsis: Regex::new(r"\.\s*\.\s*\.")?,
        })
    }

    pub fn normalize(&self, text: &str) -> String {
        let composed: String = text.nfkc().collect();
        let stripped: String = composed
            .chars()
            .map(|ch| {
                if ch == '\u{a0}' || BULLETS.contains(&ch) || SEPARATORS.contains(&ch) {
                    ' '
                } else {
                    ch
                }
            })
            .collect();
        let without_ellipses = self.ellipsis.replace_all(&stripped, " ");
        normalize_whitespace(&split_camel_case(&without_ellipses))
    }
}
