//! Output formats the downloader can be asked for.
//!
//! Tokens are matched case-sensitively. The blank token and `default` both map
//! to MP3 audio, and [`FormatRegistry::resolve`] falls back to that descriptor
//! for anything it does not know.

use std::fmt;

/// How a single format token is handed to the downloader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub codec: &'static str,
    pub extension: &'static str,
    pub is_audio_only: bool,
}

impl FormatDescriptor {
    const fn audio(codec: &'static str, extension: &'static str) -> Self {
        Self {
            codec,
            extension,
            is_audio_only: true,
        }
    }

    const fn container(codec: &'static str, extension: &'static str) -> Self {
        Self {
            codec,
            extension,
            is_audio_only: false,
        }
    }
}

impl fmt::Display for FormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_audio_only { "audio" } else { "container" };
        write!(f, "{} (.{}, {kind})", self.codec, self.extension)
    }
}

pub const DEFAULT_TOKEN: &str = "default";

const MP3: FormatDescriptor = FormatDescriptor::audio("mp3", "mp3");

const ENTRIES: &[(&str, FormatDescriptor)] = &[
    ("ogg", FormatDescriptor::audio("vorbis", "ogg")),
    ("vorbis", FormatDescriptor::audio("vorbis", "ogg")),
    (DEFAULT_TOKEN, MP3),
    ("mp3", MP3),
    ("avi", FormatDescriptor::container("avi", "avi")),
    ("flv", FormatDescriptor::container("flv", "flv")),
    ("mkv", FormatDescriptor::container("mkv", "mkv")),
    ("mov", FormatDescriptor::container("mov", "mov")),
    ("mp4", FormatDescriptor::container("mp4", "mp4")),
    ("webm", FormatDescriptor::audio("webm", "webm")),
    ("aac", FormatDescriptor::audio("aac", "aac")),
    ("aiff", FormatDescriptor::audio("aiff", "aiff")),
    ("alac", FormatDescriptor::audio("alac", "alac")),
    ("flac", FormatDescriptor::audio("flac", "flac")),
    ("m4a", FormatDescriptor::audio("m4a", "m4a")),
    ("mka", FormatDescriptor::audio("mka", "mka")),
    ("opus", FormatDescriptor::audio("opus", "opus")),
    ("wav", FormatDescriptor::audio("wav", "wav")),
    ("", MP3),
];

/// Read-only table of every token a user may type at the format prompt.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    entries: Vec<(&'static str, FormatDescriptor)>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self {
            entries: ENTRIES.to_vec(),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.lookup(token).is_some()
    }

    /// Tokens in table order, blank token included.
    pub fn supported_tokens(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(token, _)| *token)
    }

    pub fn default_descriptor(&self) -> &FormatDescriptor {
        self.lookup(DEFAULT_TOKEN).unwrap_or(&MP3)
    }

    pub fn resolve(&self, token: &str) -> &FormatDescriptor {
        self.lookup(token).unwrap_or_else(|| self.default_descriptor())
    }

    fn lookup(&self, token: &str) -> Option<&FormatDescriptor> {
        self.entries
            .iter()
            .find(|(key, _)| *key == token)
            .map(|(_, descriptor)| descriptor)
    }
}
