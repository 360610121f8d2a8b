//! Draft form and attachment payloads

use std::fmt;

use crate::error::{Error, Result};

use super::note::NewNote;

/// Raw attachment picked by the user, not yet uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Original file name, used to build the blob key.
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        let content_type = content_type.into().trim().to_string();
        self.content_type = (!content_type.is_empty()).then_some(content_type);
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("bytes", &format_args!("{} bytes", self.bytes.len()))
            .finish()
    }
}

/// Client-local note form.
///
/// Only cleared after the note it describes has been created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftForm {
    pub name: String,
    pub description: String,
    pub attachment: Option<Attachment>,
}

impl DraftForm {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            attachment: None,
        }
    }

    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Check required fields and return the trimmed create payload.
    ///
    /// The returned payload has no image key yet; it is attached after upload.
    pub fn validate(&self) -> Result<NewNote> {
        let name = self.name.trim();
        let description = self.description.trim();

        let mut missing = Vec::new();
        if name.is_empty() {
            missing.push("name");
        }
        if description.is_empty() {
            missing.push("description");
        }
        if !missing.is_empty() {
            return Err(Error::Validation(format!(
                "{} cannot be empty",
                missing.join(" and ")
            )));
        }

        Ok(NewNote::new(name, description))
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_blank(&self) -> bool {
        self.name.is_empty() && self.description.is_empty() && self.attachment.is_none()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn validate_trims_fields() {
        let draft = DraftForm::new("  Milk ", " Buy milk\n");
        assert_eq!(draft.validate().unwrap(), NewNote::new("Milk", "Buy milk"));
    }

    #[test]
    fn validate_names_every_missing_field() {
        let err = DraftForm::new(" ", "").validate().unwrap_err();
        match err {
            Error::Validation(message) => {
                assert_eq!(message, "name and description cannot be empty");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = DraftForm::new("Milk", "   ").validate().unwrap_err();
        assert!(matches!(err, Error::Validation(message) if message.starts_with("description")));
    }

    #[test]
    fn clear_resets_everything() {
        let mut draft = DraftForm::new("Milk", "Buy milk")
            .with_attachment(Attachment::new("milk.png", vec![1, 2, 3]));
        assert!(!draft.is_blank());

        draft.clear();
        assert!(draft.is_blank());
        assert_eq!(draft, DraftForm::default());
    }

    #[test]
    fn attachment_debug_hides_payload() {
        let attachment = Attachment::new("cat.png", vec![7; 4]).with_content_type(" image/png ");
        assert_eq!(attachment.content_type.as_deref(), Some("image/png"));
        let rendered = format!("{attachment:?}");
        assert!(rendered.contains("4 bytes"));
        assert!(!rendered.contains("[7, 7"));
    }

    #[test]
    fn blank_content_type_is_dropped() {
        let attachment = Attachment::new("cat.png", vec![1]).with_content_type("  ");
        assert_eq!(attachment.content_type, None);
    }
}
