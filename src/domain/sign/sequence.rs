//! Word-to-clip resolution for sign-language playback

use std::collections::HashMap;

/// Route under which the backend serves sign clips
pub const SIGN_CLIP_ROUTE: &str = "/static/signs";

/// One clip to play for one word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignClip {
    pub word: String,
    pub file: String,
}

impl SignClip {
    /// Absolute URL of the clip on the given server
    pub fn url(&self, base_url: &str) -> String {
        clip_url(base_url, &self.file)
    }
}

/// URL of a clip file served by `base_url`
pub fn clip_url(base_url: &str, file: &str) -> String {
    format!(
        "{}{}/{}",
        base_url.trim_end_matches('/'),
        SIGN_CLIP_ROUTE,
        file
    )
}

/// Split a transcription into sign lookup words.
///
/// Uppercases, strips everything but ASCII word characters and whitespace,
/// then splits on whitespace.
pub fn sign_words(text: &str) -> Vec<String> {
    text.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Dictionary from uppercase word to clip file name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignMap {
    entries: HashMap<String, String>,
}

impl SignMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry; the word is normalized to uppercase
    pub fn insert(&mut self, word: &str, file: impl Into<String>) {
        self.entries.insert(word.trim().to_uppercase(), file.into());
    }

    pub fn get(&self, word: &str) -> Option<&str> {
        self.entries.get(word).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clips for `text` in word order. Words without a clip are skipped.
    pub fn plan(&self, text: &str) -> Vec<SignClip> {
        sign_words(text)
            .into_iter()
            .filter_map(|word| {
                let file = self.get(&word)?.to_string();
                Some(SignClip { word, file })
            })
            .collect()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for SignMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = SignMap::new();
        for (word, file) in iter {
            map.insert(word.as_ref(), file);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> SignMap {
        [("hello", "hello.mp4"), ("WORLD", "world.mp4"), ("thank_you", "thanks.mp4")]
            .into_iter()
            .collect()
    }

    #[test]
    fn words_are_uppercased_and_stripped() {
        assert_eq!(sign_words("Hello, world!"), vec!["HELLO", "WORLD"]);
    }

    #[test]
    fn words_split_on_any_whitespace() {
        assert_eq!(sign_words("  a\tb\n\nc  "), vec!["A", "B", "C"]);
    }

    #[test]
    fn empty_text_has_no_words() {
        assert!(sign_words("").is_empty());
        assert!(sign_words("?!.").is_empty());
    }

    #[test]
    fn underscore_is_a_word_character() {
        assert_eq!(sign_words("thank_you"), vec!["THANK_YOU"]);
    }

    #[test]
    fn plan_skips_unknown_words() {
        let clips = sample_map().plan("hello there world");
        let files: Vec<_> = clips.iter().map(|c| c.file.as_str()).collect();
        assert_eq!(files, vec!["hello.mp4", "world.mp4"]);
    }

    #[test]
    fn plan_keeps_repeats_in_order() {
        let clips = sample_map().plan("world hello world");
        let words: Vec<_> = clips.iter().map(|c| c.word.as_str()).collect();
        assert_eq!(words, vec!["WORLD", "HELLO", "WORLD"]);
    }

    #[test]
    fn keys_are_normalized_on_insert() {
        let map = sample_map();
        assert_eq!(map.get("HELLO"), Some("hello.mp4"));
        assert_eq!(map.get("hello"), None);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn clip_url_joins_base() {
        let clip = SignClip {
            word: "HELLO".into(),
            file: "hello.mp4".into(),
        };
        assert_eq!(
            clip.url("http://localhost:5001/"),
            "http://localhost:5001/static/signs/hello.mp4"
        );
    }
}
