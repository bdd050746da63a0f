//! Reported error kinds and the single current-error slot.

use thiserror::Error;

/// Failures surfaced to the user.
///
/// Every entry point of the editor converts its failures into one of these
/// and records it in an [`ErrorSlot`]; nothing escapes an event handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    /// Malformed or unsupported image bytes. Prior state is retained.
    #[error("Could not decode image: {0}")]
    Decode(String),
    /// The operation needs state that is not there yet (e.g. a base image).
    #[error("{0}")]
    Precondition(&'static str),
    /// Export could not produce a file.
    #[error("Export failed: {0}")]
    Export(String),
}

impl EditorError {
    /// Precondition failure for adding overlays before a base image exists.
    pub const NO_BASE_IMAGE: EditorError =
        EditorError::Precondition("Upload a base image before adding overlays");

    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            EditorError::Decode(_) => "decode",
            EditorError::Precondition(_) => "precondition",
            EditorError::Export(_) => "export",
        }
    }
}

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Holds at most one reported error; a new error replaces the old one.
#[derive(Debug, Clone, Default)]
pub struct ErrorSlot {
    current: Option<EditorError>,
}

impl ErrorSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error, replacing whatever was there.
    pub fn report(&mut self, error: EditorError) {
        log::error!("{error}");
        self.current = Some(error);
    }

    /// Record the error of a failed result and pass the result through.
    pub fn capture<T>(&mut self, result: EditorResult<T>) -> EditorResult<T> {
        if let Err(e) = &result {
            self.report(e.clone());
        }
        result
    }

    /// The current error, if any.
    pub fn current(&self) -> Option<&EditorError> {
        self.current.as_ref()
    }

    /// User-facing message of the current error.
    pub fn message(&self) -> Option<String> {
        self.current.as_ref().map(ToString::to_string)
    }

    /// Clear the slot.
    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_error_replaces_old() {
        let mut slot = ErrorSlot::new();
        slot.report(EditorError::Decode("bad header".into()));
        slot.report(EditorError::NO_BASE_IMAGE);

        assert_eq!(slot.current(), Some(&EditorError::NO_BASE_IMAGE));
        assert_eq!(slot.current().map(EditorError::kind), Some("precondition"));
    }

    #[test]
    fn test_capture_passes_result_through() {
        let mut slot = ErrorSlot::new();
        let ok: EditorResult<u32> = slot.capture(Ok(3));
        assert_eq!(ok, Ok(3));
        assert!(slot.current().is_none());

        let err: EditorResult<u32> = slot.capture(Err(EditorError::Export("no base image".into())));
        assert!(err.is_err());
        assert_eq!(slot.message().as_deref(), Some("Export failed: no base image"));

        slot.clear();
        assert!(slot.message().is_none());
    }
}
