//! In-memory file attachments.

use bytes::Bytes;

/// A file read from a workflow folder (or the command line), ready to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name as shown in Discord.
    pub name: String,
    /// MIME type sent with the multipart part.
    pub content_type: String,
    /// Raw file contents.
    pub data: Bytes,
}

impl Attachment {
    /// Build an attachment, guessing the content type from the file name.
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        let content_type = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            name,
            content_type,
            data: data.into(),
        }
    }

    /// Whether the attachment is an image according to its content type.
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
