//! Upload/download media rules: accepted video containers, multipart
//! content types, and the suggested name for downloaded audio.

use crate::error::CoreError;
use crate::types::ArtifactId;

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

/// Video containers the converter accepts.
pub const ACCEPTED_VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv"];

/// Resolve the multipart content type for an upload, rejecting file names
/// whose extension the converter does not accept.
pub fn video_content_type(file_name: &str) -> Result<&'static str, CoreError> {
    let ext = extension(file_name)
        .ok_or_else(|| CoreError::UnsupportedFileType(file_name.to_string()))?;

    match ext.as_str() {
        "mp4" => Ok("video/mp4"),
        "avi" => Ok("video/x-msvideo"),
        "mov" => Ok("video/quicktime"),
        "mkv" => Ok("video/x-matroska"),
        _ => Err(CoreError::UnsupportedFileType(file_name.to_string())),
    }
}

/// Lowercased extension, without the dot.
fn extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

// ---------------------------------------------------------------------------
// Download
// ---------------------------------------------------------------------------

/// MIME type of converted artifacts.
pub const AUDIO_MIME_TYPE: &str = "audio/mpeg";

/// Extension appended to downloaded artifact identifiers.
pub const AUDIO_EXTENSION: &str = "mp3";

/// Suggested file name for a downloaded artifact: `<artifactId>.mp3`.
pub fn audio_file_name(artifact_id: &ArtifactId) -> String {
    format!("{artifact_id}.{AUDIO_EXTENSION}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn accepted_extensions_resolve() {
        assert_eq!(video_content_type("clip.mp4").unwrap(), "video/mp4");
        assert_eq!(video_content_type("a.b.MOV").unwrap(), "video/quicktime");
        assert_eq!(video_content_type("x.mkv").unwrap(), "video/x-matroska");
        assert_eq!(video_content_type("x.avi").unwrap(), "video/x-msvideo");
    }

    #[test]
    fn every_accepted_extension_has_a_content_type() {
        for ext in ACCEPTED_VIDEO_EXTENSIONS {
            assert!(video_content_type(&format!("file.{ext}")).is_ok(), "{ext}");
        }
    }

    #[test]
    fn rejects_unknown_or_missing_extension() {
        assert_matches!(
            video_content_type("notes.txt"),
            Err(CoreError::UnsupportedFileType(_))
        );
        assert_matches!(
            video_content_type("noextension"),
            Err(CoreError::UnsupportedFileType(_))
        );
        assert_matches!(
            video_content_type(".mp4"),
            Err(CoreError::UnsupportedFileType(_))
        );
    }

    #[test]
    fn audio_name_appends_mp3() {
        let id = ArtifactId::new("mp3-7").unwrap();
        assert_eq!(audio_file_name(&id), "mp3-7.mp3");
    }
}
