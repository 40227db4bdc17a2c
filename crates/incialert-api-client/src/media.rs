//! Media attachments for incident reports.

use std::path::{Component, Path};

use incialert_core::constants::MEDIA_FORM_FIELD;
use incialert_core::models::NewIncident;
use reqwest::multipart::{Form, Part};

use crate::error::{ClientError, ClientResult};

/// A file to upload alongside an incident report.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl MediaUpload {
    /// MIME type is guessed from the file name.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            file_name,
            mime_type,
            bytes,
        }
    }

    /// Read a local file. Paths with `..` components are refused.
    pub fn from_path(path: &Path) -> ClientResult<Self> {
        if path.components().any(|c| c == Component::ParentDir) {
            return Err(ClientError::Media(format!(
                "Invalid input: {}",
                path.display()
            )));
        }
        let bytes = std::fs::read(path).map_err(|e| {
            ClientError::Media(format!("Failed to read file {}: {}", path.display(), e))
        })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.bin");
        Ok(Self::new(file_name, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn into_part(self) -> ClientResult<Part> {
        Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.mime_type)
            .map_err(|e| ClientError::Media(format!("Invalid MIME type: {}", e)))
    }
}

impl std::fmt::Debug for MediaUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaUpload")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Every present incident field as a text part, then one `media` part per file.
pub(crate) fn incident_form(data: &NewIncident, media: Vec<MediaUpload>) -> ClientResult<Form> {
    let mut form = Form::new();
    for (name, value) in data.form_fields() {
        form = form.text(name, value);
    }
    for upload in media {
        form = form.part(MEDIA_FORM_FIELD, upload.into_part()?);
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_mime_from_file_name() {
        assert_eq!(MediaUpload::new("scene.jpg", vec![]).mime_type, "image/jpeg");
        assert_eq!(MediaUpload::new("clip.mp4", vec![]).mime_type, "video/mp4");
        assert_eq!(
            MediaUpload::new("noext", vec![]).mime_type,
            "application/octet-stream"
        );
    }

    #[test]
    fn from_path_reads_file_and_rejects_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let upload = MediaUpload::from_path(&path).unwrap();
        assert_eq!(upload.file_name, "photo.png");
        assert_eq!(upload.mime_type, "image/png");
        assert_eq!(upload.size(), 3);

        let sneaky = dir.path().join("..").join("photo.png");
        assert!(matches!(
            MediaUpload::from_path(&sneaky),
            Err(ClientError::Media(_))
        ));
    }

    #[test]
    fn missing_file_is_a_media_error() {
        let err = MediaUpload::from_path(Path::new("/definitely/not/here.jpg")).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }
}
