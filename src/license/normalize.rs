use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Opening of a copyright notice line. The holder and year vary per project,
/// so these lines are left out of matching entirely. A Latin-1 `©` decodes
/// to U+FFFD.
static COPYRIGHT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:copyright\s*(?:\(c\)|©|\x{FFFD}|\d)|\(c\)\s*\d|©)")
        .expect("valid regex")
});

/// A normalized word and where it sits in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Split `text` into lowercase words, skipping copyright lines and bare numbers.
pub fn words(text: &str) -> Vec<Word> {
    let mut out = Vec::new();
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        if !COPYRIGHT_LINE.is_match(line) {
            push_line_words(line, offset, &mut out);
        }
        offset += line.len();
    }

    out
}

/// Like [`words`], for raw file contents. Invalid UTF-8 sequences become
/// word breaks, and word offsets index `content` itself.
pub fn words_in_bytes(content: &[u8]) -> Vec<Word> {
    let (text, raw_offsets) = decode(content);
    let mut out = words(&text);
    if let Some(raw_offsets) = raw_offsets {
        for w in &mut out {
            w.start = raw_offsets[w.start];
            w.end = raw_offsets[w.end];
        }
    }
    out
}

/// Decode `content` lossily. When replacement characters were inserted, also
/// return the raw offset of every decoded byte offset (plus the end).
fn decode(content: &[u8]) -> (Cow<'_, str>, Option<Vec<usize>>) {
    if let Ok(text) = std::str::from_utf8(content) {
        return (Cow::Borrowed(text), None);
    }

    let mut text = String::with_capacity(content.len());
    let mut raw_offsets = Vec::with_capacity(content.len() + 1);
    let mut raw = 0;

    for chunk in content.utf8_chunks() {
        let valid = chunk.valid();
        text.push_str(valid);
        raw_offsets.extend(raw..raw + valid.len());
        raw += valid.len();

        let invalid = chunk.invalid();
        if !invalid.is_empty() {
            text.push(char::REPLACEMENT_CHARACTER);
            let len = raw_offsets.len() + char::REPLACEMENT_CHARACTER.len_utf8();
            raw_offsets.resize(len, raw);
            raw += invalid.len();
        }
    }
    raw_offsets.push(raw);

    (Cow::Owned(text), Some(raw_offsets))
}

fn push_line_words(line: &str, offset: usize, out: &mut Vec<Word>) {
    let mut start = None;
    for (i, c) in line.char_indices() {
        match (c.is_alphanumeric(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                push_word(&line[s..i], offset + s, out);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        push_word(&line[s..], offset + s, out);
    }
}

fn push_word(raw: &str, start: usize, out: &mut Vec<Word>) {
    // List numbering, years and version numbers
    if raw.chars().all(|c| c.is_ascii_digit()) {
        return;
    }
    let lower = raw.to_lowercase();
    let text = match lower.as_str() {
        "licence" => "license".to_string(),
        "licences" => "licenses".to_string(),
        "licenced" => "licensed".to_string(),
        _ => lower,
    };
    out.push(Word {
        text,
        start,
        end: start + raw.len(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<String> {
        words(input).into_iter().map(|w| w.text).collect()
    }

    #[test]
    fn test_lowercase_and_punctuation() {
        assert_eq!(
            texts("THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT"),
            vec!["the", "software", "is", "provided", "as", "is", "without"]
        );
        assert_eq!(texts("and/or"), vec!["and", "or"]);
    }

    #[test]
    fn test_numbers_dropped() {
        assert_eq!(
            texts("1. Redistributions of source code, version 2.0"),
            vec!["redistributions", "of", "source", "code", "version"]
        );
    }

    #[test]
    fn test_british_spelling() {
        assert_eq!(texts("this Licence"), vec!["this", "license"]);
    }

    #[test]
    fn test_copyright_lines_skipped() {
        let input = "Copyright (c) 2019 Jane Doe\nCopyright 2020 Google Inc\n(c) 2021 Foo\nPermission granted";
        assert_eq!(texts(input), vec!["permission", "granted"]);
    }

    #[test]
    fn test_wrapped_copyright_word_kept() {
        let input = "must retain the above\ncopyright notice, this list";
        assert_eq!(
            texts(input),
            vec!["must", "retain", "the", "above", "copyright", "notice", "this", "list"]
        );
    }

    #[test]
    fn test_offsets() {
        let input = "Copyright 2019 X\nHello, wörld";
        let ws = words(input);
        assert_eq!(ws.len(), 2);
        assert_eq!(&input[ws[0].start..ws[0].end], "Hello");
        assert_eq!(&input[ws[1].start..ws[1].end], "wörld");
    }

    #[test]
    fn test_latin1_offsets() {
        let input = b"Copyright \xa9 2019 Jos\xe9\nna\xefve caf\xe9 ok";
        let ws = words_in_bytes(input);
        let texts: Vec<&str> = ws.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["na", "ve", "caf", "ok"]);
        for w in &ws {
            assert_eq!(&input[w.start..w.end], w.text.as_bytes());
        }
        assert_eq!(ws[3].end, input.len());
    }

    #[test]
    fn test_utf8_bytes_unchanged() {
        let input = "Copyright © 2019 X\nHello, wörld";
        assert_eq!(words_in_bytes(input.as_bytes()), words(input));
    }

    #[test]
    fn test_empty() {
        assert!(words("").is_empty());
        assert!(words("  \n\n ... \n").is_empty());
    }
}
