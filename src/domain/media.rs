use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::NoteId;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

const FILENAME_PREFIX: &str = "gemini_tts_";

/// Media file name for a note: `gemini_tts_<note_id>_<timestamp>.wav`.
pub fn audio_filename(note_id: NoteId, timestamp: i64) -> String {
    format!("{}{}_{}.wav", FILENAME_PREFIX, note_id, timestamp)
}

/// Field markup that makes the host play a media file.
pub fn sound_tag(filename: &str) -> String {
    format!("[sound:{}]", filename)
}

/// Extract the file name from a `[sound:...]` token.
pub fn parse_sound_tag(tag: &str) -> Option<&str> {
    tag.trim()
        .strip_prefix("[sound:")?
        .strip_suffix(']')
        .filter(|name| !name.is_empty())
}

/// Split a generated file name back into note id and timestamp.
pub fn parse_audio_filename(filename: &str) -> Option<(NoteId, i64)> {
    let stem = filename.strip_prefix(FILENAME_PREFIX)?.strip_suffix(".wav")?;
    // Note ids may be negative, so split on the last underscore
    let (id, ts) = stem.rsplit_once('_')?;
    Some((NoteId(id.parse().ok()?), ts.parse().ok()?))
}

/// Strip HTML tags and collapse whitespace in field content.
pub fn clean_source_text(html: &str) -> String {
    let without_tags = HTML_TAG.replace_all(html, "");
    let without_nbsp = without_tags.replace("&nbsp;", " ");
    WHITESPACE.replace_all(&without_nbsp, " ").trim().to_string()
}
