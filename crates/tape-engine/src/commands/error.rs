use thiserror::Error;

use crate::scene::Id;

/// Stable machine-readable error codes of the command protocol.
/// Additions are a versioned extension; existing strings never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmdCode {
    /// Malformed JSON or unknown command.
    ParseError,
    /// Required field absent or wrong JSON type/value.
    MissingField,
    /// Zero or non-decimal string where an id is required.
    InvalidId,
    /// Caller-supplied id is already live.
    DuplicateId,
    /// Referenced resource does not exist or has the wrong kind.
    InvalidRef,
    /// Pipeline's required vertex format does not match the geometry's.
    FormatMismatch,
    /// Pipeline name/version not in the catalog.
    PipelineUnknown,
    /// beginFrame while in-frame, or commitFrame while not.
    FrameState,
    /// Draw item bound without a geometry to draw.
    ValidationMissingGeometry,
}

impl CmdCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ParseError => "PARSE_ERROR",
            Self::MissingField => "MISSING_FIELD",
            Self::InvalidId => "INVALID_ID",
            Self::DuplicateId => "DUPLICATE_ID",
            Self::InvalidRef => "INVALID_REF",
            Self::FormatMismatch => "FORMAT_MISMATCH",
            Self::PipelineUnknown => "PIPELINE_UNKNOWN",
            Self::FrameState => "FRAME_STATE",
            Self::ValidationMissingGeometry => "VALIDATION_MISSING_GEOMETRY",
        }
    }
}

/// A rejected command: stable code, human message, and an optional minimal
/// JSON fragment naming the offending fields.
#[derive(Debug, Clone, Error)]
#[error("{}: {}", .code.as_str(), .message)]
pub struct CmdError {
    pub code: CmdCode,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl CmdError {
    pub fn new(code: CmdCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Successful command application.
#[derive(Debug, Clone, Default)]
pub struct CmdOutput {
    /// Id of the created resource, or 0 for non-creating commands.
    pub created_id: Id,
    /// Every id released by a `delete` cascade (empty otherwise). The caller
    /// uses this to drop matching CPU buffers from the ingest store.
    pub released: Vec<Id>,
}

impl CmdOutput {
    pub fn created(id: Id) -> Self {
        Self {
            created_id: id,
            released: Vec::new(),
        }
    }
}

pub type CmdResult = Result<CmdOutput, CmdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_strings() {
        assert_eq!(CmdCode::ParseError.as_str(), "PARSE_ERROR");
        assert_eq!(CmdCode::DuplicateId.as_str(), "DUPLICATE_ID");
        assert_eq!(
            CmdCode::ValidationMissingGeometry.as_str(),
            "VALIDATION_MISSING_GEOMETRY"
        );
    }

    #[test]
    fn error_display_includes_code() {
        let e = CmdError::new(CmdCode::InvalidRef, "no such layer");
        assert_eq!(e.to_string(), "INVALID_REF: no such layer");
    }
}
