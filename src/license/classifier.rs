use std::cmp::Reverse;
use std::sync::Arc;

use crate::license::corpus::{Corpus, CorpusEntry, SHINGLE};
use crate::license::normalize::{words_in_bytes, Word};
use crate::models::{Coverage, Match};

/// Minimum share of a reference text that must be found for it to count as a match.
pub const DEFAULT_MATCH_FLOOR: f64 = 75.0;

/// Largest run of unaligned input words tolerated inside one match
/// (substituted names, inserted clauses).
const MAX_GAP: usize = 16;

/// Two overlapping matches within this many points are both reported.
const TIE_MARGIN: f64 = 1.0;

/// Classify `content` against the built-in corpus with default settings.
pub fn classify(content: &[u8]) -> Coverage {
    Classifier::new(Corpus::builtin()).classify(content)
}

/// Matches text against a reference corpus.
///
/// Stateless apart from the shared read-only corpus; one instance can serve
/// any number of threads.
#[derive(Debug, Clone)]
pub struct Classifier {
    corpus: Arc<Corpus>,
    floor: f64,
}

/// An exact word run shared by the input and a reference text.
#[derive(Debug, Clone, Copy)]
struct Run {
    input: usize,
    reference: usize,
    len: usize,
}

#[derive(Debug, Clone)]
struct Candidate {
    entry: usize,
    percent: f64,
    /// Input word range `[start, end)`.
    start: usize,
    end: usize,
    /// Input words inside exact runs.
    aligned: usize,
}

impl Classifier {
    pub fn new(corpus: Arc<Corpus>) -> Self {
        Self {
            corpus,
            floor: DEFAULT_MATCH_FLOOR,
        }
    }

    pub fn with_floor(mut self, floor: f64) -> Self {
        self.floor = floor.clamp(0.0, 100.0);
        self
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Report which reference licenses `content` contains and how much of it they cover.
    pub fn classify(&self, content: &[u8]) -> Coverage {
        let input = words_in_bytes(content);
        if input.is_empty() {
            return Coverage::default();
        }

        let ids: Vec<u32> = input.iter().map(|w| self.corpus.word_id(&w.text)).collect();

        let mut candidates = Vec::new();
        for (entry_idx, entry) in self.corpus.entries().iter().enumerate() {
            let runs = align(&ids, entry);
            for cluster in clusters(&runs) {
                let candidate = score(entry_idx, entry, cluster);
                if candidate.percent >= self.floor {
                    candidates.push(candidate);
                }
            }
        }

        let accepted = select(candidates);
        if accepted.is_empty() {
            return Coverage::default();
        }

        let mut covered = vec![false; input.len()];
        for c in &accepted {
            covered[c.start..c.end].fill(true);
        }
        let covered_words = covered.iter().filter(|&&w| w).count();

        Coverage {
            percent: covered_words as f64 * 100.0 / input.len() as f64,
            matches: accepted
                .iter()
                .map(|c| self.to_match(c, &input))
                .collect(),
        }
    }

    fn to_match(&self, c: &Candidate, input: &[Word]) -> Match {
        let entry = &self.corpus.entries()[c.entry];
        Match {
            name: entry.name.clone(),
            license_type: entry.license_type,
            percent: c.percent,
            start: input[c.start].start,
            end: input[c.end - 1].end,
        }
    }
}

/// Greedy left-to-right alignment of `input` against one reference text.
fn align(input: &[u32], entry: &CorpusEntry) -> Vec<Run> {
    let reference = &entry.words;
    let mut runs = Vec::new();
    let mut i = 0;
    let mut last_end = 0;

    while i + SHINGLE <= input.len() {
        let best = entry
            .positions(&input[i..i + SHINGLE])
            .iter()
            .map(|&j| (j, common_prefix(&input[i..], &reference[j..])))
            // Prefer continuing forward in the reference, then the longest run.
            .max_by_key(|&(j, len)| (j >= last_end, len, Reverse(j)));

        match best {
            Some((j, len)) => {
                runs.push(Run {
                    input: i,
                    reference: j,
                    len,
                });
                last_end = j + len;
                i += len;
            }
            None => i += 1,
        }
    }

    runs
}

fn common_prefix(a: &[u32], b: &[u32]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Split runs wherever the input gap grows too large or the reference jumps back.
fn clusters(runs: &[Run]) -> Vec<&[Run]> {
    let mut out = Vec::new();
    let mut start = 0;

    for k in 1..runs.len() {
        let prev = runs[k - 1];
        let run = runs[k];
        let gap = run.input - (prev.input + prev.len);
        if gap > MAX_GAP || run.reference < prev.reference + prev.len {
            out.push(&runs[start..k]);
            start = k;
        }
    }
    if !runs.is_empty() {
        out.push(&runs[start..]);
    }

    out
}

fn score(entry_idx: usize, entry: &CorpusEntry, cluster: &[Run]) -> Candidate {
    let mut seen = vec![false; entry.words.len()];
    for run in cluster {
        seen[run.reference..run.reference + run.len].fill(true);
    }
    let found = seen.iter().filter(|&&w| w).count();

    let first = cluster[0];
    let last = cluster[cluster.len() - 1];
    Candidate {
        entry: entry_idx,
        percent: found as f64 * 100.0 / entry.words.len() as f64,
        start: first.input,
        end: last.input + last.len,
        aligned: cluster.iter().map(|r| r.len).sum(),
    }
}

/// Keep the strongest candidate for each region of the input, plus near-ties.
fn select(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.percent
            .total_cmp(&a.percent)
            .then(b.aligned.cmp(&a.aligned))
            .then(a.entry.cmp(&b.entry))
            .then(a.start.cmp(&b.start))
    });

    let mut accepted: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        let shadowed = accepted.iter().any(|a| {
            let overlap = a
                .end
                .min(candidate.end)
                .saturating_sub(a.start.max(candidate.start));
            overlap > 0
                && overlap * 2 >= candidate.end - candidate.start
                && !near_tie(a, &candidate)
        });
        if !shadowed {
            accepted.push(candidate);
        }
    }

    accepted.sort_by_key(|c| c.start);
    accepted
}

fn near_tie(a: &Candidate, b: &Candidate) -> bool {
    (a.percent - b.percent).abs() <= TIE_MARGIN && b.aligned * 100 >= a.aligned * 95
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LicenseType;

    const MIT: &str = include_str!("corpus/MIT.txt");
    const BSD0: &str = include_str!("corpus/BSD-0-Clause.txt");
    const BSD2: &str = include_str!("corpus/BSD-2-Clause.txt");
    const BSD3: &str = include_str!("corpus/BSD-3-Clause.txt");
    const ISC: &str = include_str!("corpus/ISC.txt");
    const APACHE: &str = include_str!("corpus/Apache-2.0.txt");

    const LOREM: &str = "
Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod
tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim
veniam, quis nostrud exercitation ullamco laboris nisi ut aliquip ex ea
commodo consequat.";

    /// Same side of the 90% line and within 4 points.
    fn coverage_percent_eq(a: f64, b: f64) -> bool {
        (a >= 90.0) == (b >= 90.0) && (a - b).abs() <= 4.0
    }

    fn names(cov: &Coverage) -> Vec<&str> {
        cov.matches.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn test_exact_mit() {
        let cov = classify(MIT.as_bytes());
        assert_eq!(names(&cov), vec!["MIT"]);
        assert_eq!(cov.matches[0].license_type, LicenseType::MIT);
        assert_eq!(cov.matches[0].percent, 100.0);
        assert_eq!(cov.percent, 100.0);
    }

    #[test]
    fn test_copyright_holder_ignored() {
        let text = format!("Copyright 2019 Google Inc\n\n{MIT}");
        let cov = classify(text.as_bytes());
        assert_eq!(names(&cov), vec!["MIT"]);
        assert_eq!(cov.percent, 100.0);
    }

    #[test]
    fn test_heading_lowers_coverage_slightly() {
        let text = format!("# MIT License\n\nCopyright (c) 2020 Jane Doe\n\n{MIT}");
        let cov = classify(text.as_bytes());
        assert_eq!(names(&cov), vec!["MIT"]);
        assert!(coverage_percent_eq(cov.percent, 99.0), "{}", cov.percent);
    }

    #[test]
    fn test_two_licenses_back_to_back() {
        let text = format!("{MIT}\n{BSD0}");
        let cov = classify(text.as_bytes());
        assert_eq!(names(&cov), vec!["MIT", "BSD-0-Clause"]);
        assert_eq!(cov.matches[0].percent, 100.0);
        assert_eq!(cov.matches[1].percent, 100.0);
        assert!(coverage_percent_eq(cov.percent, 100.0), "{}", cov.percent);
        assert!(cov.matches[0].end <= cov.matches[1].start);
    }

    #[test]
    fn test_trailing_prose_lowers_coverage() {
        let text = format!("{MIT}{LOREM}");
        let cov = classify(text.as_bytes());
        assert_eq!(names(&cov), vec!["MIT"]);
        assert_eq!(cov.matches[0].percent, 100.0);
        assert!(cov.percent < 90.0);
        assert!(coverage_percent_eq(cov.percent, 81.9095), "{}", cov.percent);
    }

    #[test]
    fn test_span_offsets() {
        let text = format!("Preamble words here.\n\n{MIT}");
        let cov = classify(text.as_bytes());
        let m = &cov.matches[0];
        assert!(text[m.start..m.end].starts_with("Permission is hereby granted"));
        assert!(text[m.start..m.end].ends_with("SOFTWARE"));
    }

    #[test]
    fn test_latin1_copyright_spans_raw_bytes() {
        let mut raw = b"Copyright \xa9 2019 Jos\xe9 Garc\xeda\n\n".to_vec();
        raw.extend_from_slice(MIT.as_bytes());
        let cov = classify(&raw);
        assert_eq!(names(&cov), vec!["MIT"]);
        assert_eq!(cov.percent, 100.0);
        let m = &cov.matches[0];
        assert!(m.end <= raw.len());
        assert!(raw[m.start..m.end].starts_with(b"Permission is hereby granted"));
        assert!(raw[m.start..m.end].ends_with(b"SOFTWARE"));
    }

    #[test]
    fn test_unknown_text() {
        let cov = classify(b"This is not a license. Do whatever you like, but please say hi.");
        assert!(cov.is_zero());
    }

    #[test]
    fn test_empty_and_binary() {
        assert!(classify(b"").is_zero());
        assert!(classify(&[0xff, 0xfe, 0x00, 0x80]).is_zero());
    }

    #[test]
    fn test_modified_wording_still_matches() {
        let text = MIT
            .replace("free of charge", "at no cost")
            .replace("merge, publish", "merge, print, publish");
        let cov = classify(text.as_bytes());
        assert_eq!(names(&cov), vec!["MIT"]);
        assert!(cov.matches[0].percent > 95.0);
        assert!(cov.matches[0].percent < 100.0);
    }

    #[test]
    fn test_named_holder_in_bsd3() {
        let text = format!(
            "Copyright (c) 2009 The Go Authors. All rights reserved.\n\n{}",
            BSD3.replace("the copyright holder nor", "Google Inc. nor")
        );
        let cov = classify(text.as_bytes());
        assert_eq!(names(&cov), vec!["BSD-3-Clause"]);
        assert!(cov.percent >= 90.0);
    }

    #[test]
    fn test_superset_wins_over_subset() {
        // ISC contains all of 0BSD; BSD-3-Clause contains all of BSD-2-Clause.
        assert_eq!(names(&classify(ISC.as_bytes())), vec!["ISC"]);
        assert_eq!(names(&classify(BSD0.as_bytes())), vec!["BSD-0-Clause"]);
        assert_eq!(names(&classify(BSD3.as_bytes())), vec!["BSD-3-Clause"]);
        assert_eq!(names(&classify(BSD2.as_bytes())), vec!["BSD-2-Clause"]);
    }

    #[test]
    fn test_same_license_twice() {
        let text = format!("{MIT}\n{MIT}");
        let cov = classify(text.as_bytes());
        assert_eq!(names(&cov), vec!["MIT", "MIT"]);
        assert_eq!(cov.percent, 100.0);
    }

    #[test]
    fn test_long_license_then_short() {
        let text = format!("{APACHE}\n{MIT}");
        let cov = classify(text.as_bytes());
        assert_eq!(names(&cov), vec!["Apache-2.0", "MIT"]);
    }

    #[test]
    fn test_ties_are_both_reported() {
        let corpus = Arc::new(Corpus::new([
            ("MIT", LicenseType::MIT, MIT),
            ("Expat", LicenseType::MIT, MIT),
        ]));
        let cov = Classifier::new(corpus).classify(MIT.as_bytes());
        assert_eq!(names(&cov), vec!["MIT", "Expat"]);
        assert_eq!(cov.percent, 100.0);
    }

    #[test]
    fn test_custom_corpus_and_floor() {
        let corpus = Arc::new(Corpus::new([(
            "Tiny",
            LicenseType::Other,
            "you may do anything you want with this code as long as you keep this line",
        )]));
        let half = b"you may do anything you want with this code";

        let strict = Classifier::new(Arc::clone(&corpus));
        assert!(strict.classify(half).is_zero());

        let lenient = Classifier::new(corpus).with_floor(50.0);
        let cov = lenient.classify(half);
        assert_eq!(names(&cov), vec!["Tiny"]);
        assert_eq!(cov.percent, 100.0);
    }

    #[test]
    fn test_deterministic() {
        let text = format!("{MIT}\n{BSD0}{LOREM}");
        assert_eq!(classify(text.as_bytes()), classify(text.as_bytes()));
    }
}
