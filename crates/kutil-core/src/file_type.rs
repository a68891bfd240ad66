//! Known file types and extension helpers.

use std::fmt;

/// A file extension paired with its MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileType {
    stem: &'static str,
    mime_type: &'static str,
}

pub const JSON: FileType = FileType::new("json", "application/json");
pub const LOG: FileType = FileType::new("log", "text/plain");
pub const YML: FileType = FileType::new("yml", "application/x-yaml");
pub const YAML: FileType = FileType::new("yaml", "application/x-yaml");
pub const JPG: FileType = FileType::new("jpg", "image/jpeg");
pub const SVG: FileType = FileType::new("svg", "image/svg+xml");
pub const ZIP: FileType = FileType::new("zip", "application/zip");

impl FileType {
    pub const fn new(stem: &'static str, mime_type: &'static str) -> Self {
        Self { stem, mime_type }
    }

    /// Raw extension without the leading dot (e.g. `json`).
    pub fn stem(&self) -> &'static str {
        self.stem
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    /// Extension with the leading dot (e.g. `.json`).
    pub fn extension(&self) -> String {
        format!(".{}", self.stem)
    }

    /// Append the extension unless `name` already ends with it.
    pub fn add_extension(&self, name: &str) -> String {
        let ext = self.extension();
        if name.ends_with(&ext) {
            name.to_string()
        } else {
            format!("{name}{ext}")
        }
    }

    /// Remove every occurrence of the dotted extension.
    pub fn remove_extension(&self, name: &str) -> String {
        name.replace(&self.extension(), "")
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_extension_is_idempotent() {
        assert_eq!(LOG.add_extension("my_service"), "my_service.log");
        assert_eq!(LOG.add_extension("my_service.log"), "my_service.log");
    }

    #[test]
    fn remove_extension_strips_all_occurrences() {
        assert_eq!(JSON.remove_extension("a.json.json"), "a");
        assert_eq!(JSON.remove_extension("plain"), "plain");
    }

    #[test]
    fn display_and_mime() {
        assert_eq!(YAML.to_string(), ".yaml");
        assert_eq!(SVG.mime_type(), "image/svg+xml");
        assert_eq!(ZIP.stem(), "zip");
    }
}
