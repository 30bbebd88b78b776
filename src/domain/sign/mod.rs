//! Sign-language domain module

mod sequence;

pub use sequence::{clip_url, sign_words, SignClip, SignMap, SIGN_CLIP_ROUTE};
