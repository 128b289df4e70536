//! Accepted audio formats and upload filename handling

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Audio container formats accepted for transcription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    Mp3,
    Wav,
    Flac,
    Ogg,
}

impl MediaFormat {
    pub const ALL: [MediaFormat; 4] = [
        MediaFormat::Mp3,
        MediaFormat::Wav,
        MediaFormat::Flac,
        MediaFormat::Ogg,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaFormat::Mp3 => "mp3",
            MediaFormat::Wav => "wav",
            MediaFormat::Flac => "flac",
            MediaFormat::Ogg => "ogg",
        }
    }

    /// Parse an extension, ignoring case
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.as_str() == ext)
    }

    /// Format named by the text after the last `.` of a filename.
    ///
    /// A name without a dot has no extension and is rejected.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        Self::from_extension(ext)
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("static regex"));

/// Fallback when sanitizing leaves nothing usable
const EMPTY_FILENAME_FALLBACK: &str = "upload";

/// Reduce a client-supplied filename to a flat ASCII name safe for use in a
/// storage key. Path separators never survive, so `../../x.wav` becomes
/// `x.wav`. Accented letters are decomposed first and keep their base letter.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let stripped = UNSAFE_FILENAME_CHARS.replace_all(&joined, "");
    let trimmed = stripped.trim_matches(|c| c == '.' || c == '_');

    if trimmed.is_empty() {
        EMPTY_FILENAME_FALLBACK.to_string()
    } else {
        trimmed.to_string()
    }
}
