//! Extension-based file type classification.

use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Closed set of content categories a file can fall into.
///
/// Declaration order is the order used for per-type breakdowns.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FileType {
    Image,
    Video,
    Document,
    Backup,
    Log,
    Code,
    Audio,
    #[default]
    Other,
}

impl FileType {
    /// Classify a file by the extension of its name.
    ///
    /// Total: names without an extension, dotfiles and unknown extensions
    /// all classify as [`FileType::Other`].
    pub fn from_name(name: &str) -> Self {
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Other)
    }

    /// Classify a bare extension (without the leading dot), case-insensitively.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "svg" | "heic" | "webp" => Self::Image,
            "mp4" | "avi" | "mov" | "mkv" | "flv" | "wmv" | "webm" | "m4v" => Self::Video,
            "pdf" | "docx" | "doc" | "txt" | "rtf" | "odt" | "xlsx" | "xls" | "pptx" => {
                Self::Document
            }
            "zip" | "tar" | "gz" | "rar" | "7z" | "bz2" => Self::Backup,
            "csv" | "log" | "json" => Self::Log,
            "py" | "js" | "html" | "css" | "java" | "cpp" => Self::Code,
            "mp3" | "wav" | "flac" | "m4a" | "aac" => Self::Audio,
            _ => Self::Other,
        }
    }

    /// Lowercase name as used on the wire.
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_classify_known_extensions() {
        assert_eq!(FileType::from_name("photo.JPG"), FileType::Image);
        assert_eq!(FileType::from_name("clip.webm"), FileType::Video);
        assert_eq!(FileType::from_name("report.pdf"), FileType::Document);
        assert_eq!(FileType::from_name("backup.tar.gz"), FileType::Backup);
        assert_eq!(FileType::from_name("app.log"), FileType::Log);
        assert_eq!(FileType::from_name("main.py"), FileType::Code);
        assert_eq!(FileType::from_name("song.flac"), FileType::Audio);
    }

    #[test]
    fn test_classify_is_total() {
        assert_eq!(FileType::from_name("Makefile"), FileType::Other);
        assert_eq!(FileType::from_name(".bashrc"), FileType::Other);
        assert_eq!(FileType::from_name("archive."), FileType::Other);
        assert_eq!(FileType::from_name("weird.ext"), FileType::Other);
        assert_eq!(FileType::from_name(""), FileType::Other);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(FileType::Backup.as_str(), "backup");
        assert_eq!("IMAGE".parse::<FileType>().unwrap(), FileType::Image);
        assert_eq!(FileType::iter().count(), 8);
        assert_eq!(
            serde_json::to_string(&FileType::Document).unwrap(),
            "\"document\""
        );
    }
}
