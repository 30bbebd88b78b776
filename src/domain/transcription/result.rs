//! Transcription result value object

/// What the backend returned for one upload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptionResult {
    text: String,
    gloss: Vec<String>,
    videos: Vec<String>,
}

impl TranscriptionResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Attach the sign-language gloss and clip list
    pub fn with_signs(mut self, gloss: Vec<String>, videos: Vec<String>) -> Self {
        self.gloss = gloss;
        self.videos = videos;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn gloss(&self) -> &[String] {
        &self.gloss
    }

    /// Clip names chosen by the server, in playback order
    pub fn videos(&self) -> &[String] {
        &self.videos
    }
}
