use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use crate::license::normalize::words;
use crate::models::LicenseType;

/// Length of the word shingles used to index reference texts.
pub const SHINGLE: usize = 3;

/// Word id used for input words that appear in no reference text.
pub const UNKNOWN_WORD: u32 = u32::MAX;

/// Reference texts compiled into the binary: `(name, type, text)`.
const BUILTIN: &[(&str, LicenseType, &str)] = &[
    ("Apache-2.0", LicenseType::Apache, include_str!("corpus/Apache-2.0.txt")),
    ("BSD-0-Clause", LicenseType::BSD, include_str!("corpus/BSD-0-Clause.txt")),
    ("BSD-2-Clause", LicenseType::BSD, include_str!("corpus/BSD-2-Clause.txt")),
    ("BSD-3-Clause", LicenseType::BSD, include_str!("corpus/BSD-3-Clause.txt")),
    ("ISC", LicenseType::ISC, include_str!("corpus/ISC.txt")),
    ("MIT", LicenseType::MIT, include_str!("corpus/MIT.txt")),
    ("Unlicense", LicenseType::Unlicense, include_str!("corpus/Unlicense.txt")),
    ("Zlib", LicenseType::Zlib, include_str!("corpus/Zlib.txt")),
];

static BUILTIN_CORPUS: LazyLock<Arc<Corpus>> =
    LazyLock::new(|| Arc::new(Corpus::new(BUILTIN.iter().copied())));

/// One indexed reference text.
#[derive(Debug)]
pub struct CorpusEntry {
    pub name: String,
    pub license_type: LicenseType,
    /// Reference text as word ids.
    pub words: Vec<u32>,
    /// Shingle -> every position it starts at in `words`.
    index: HashMap<[u32; SHINGLE], Vec<usize>>,
}

impl CorpusEntry {
    /// Reference positions where the shingle starting with `key` occurs.
    pub fn positions(&self, key: &[u32]) -> &[usize] {
        <[u32; SHINGLE]>::try_from(key)
            .ok()
            .and_then(|k| self.index.get(&k))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// An immutable set of reference license texts sharing one vocabulary.
///
/// Built once and shared read-only between every classification, so it can
/// sit behind an `Arc` across threads without locking.
#[derive(Debug)]
pub struct Corpus {
    vocab: HashMap<String, u32>,
    entries: Vec<CorpusEntry>,
}

impl Corpus {
    /// Build a corpus from `(name, type, text)` triples.
    pub fn new<'a, I>(texts: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, LicenseType, &'a str)>,
    {
        let mut vocab: HashMap<String, u32> = HashMap::new();
        let mut entries = Vec::new();

        for (name, license_type, text) in texts {
            let ids: Vec<u32> = words(text)
                .into_iter()
                .map(|w| {
                    let next = vocab.len() as u32;
                    *vocab.entry(w.text).or_insert(next)
                })
                .collect();

            let mut index: HashMap<[u32; SHINGLE], Vec<usize>> = HashMap::new();
            for (pos, window) in ids.windows(SHINGLE).enumerate() {
                let key = [window[0], window[1], window[2]];
                index.entry(key).or_default().push(pos);
            }

            entries.push(CorpusEntry {
                name: name.to_string(),
                license_type,
                words: ids,
                index,
            });
        }

        Corpus { vocab, entries }
    }

    /// The reference texts shipped with the crate, loaded on first use.
    pub fn builtin() -> Arc<Corpus> {
        Arc::clone(&BUILTIN_CORPUS)
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    /// Id for `word`, or [`UNKNOWN_WORD`] if no reference text uses it.
    pub fn word_id(&self, word: &str) -> u32 {
        self.vocab.get(word).copied().unwrap_or(UNKNOWN_WORD)
    }
}
