use polerec_core::DocPath;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// A required field is absent in the source document. Recovered locally:
    /// the record carries an absent field and the differ reports a
    /// `*_missing` status.
    #[error("required field absent: {field}")]
    MissingField { field: String },

    /// No analysis asset entry matches this design and pole. Same local
    /// recovery as `MissingField`.
    #[error("no analysis asset entry for design {design:?}, structure {structure_id:?}")]
    AssetNotFound { design: String, structure_id: String },

    /// The document's top-level shape is wrong. Fatal: no partial extraction
    /// is attempted.
    #[error("malformed document: {reason}")]
    MalformedDocument { reason: String },
}

#[derive(Debug, Error)]
pub enum PatchError {
    /// The addressed path no longer exists, e.g. the document was reloaded
    /// with a different structure order after the address was captured.
    #[error("patch target not found: {path}")]
    TargetNotFound { path: DocPath },

    /// The replacement value's JSON kind disagrees with the existing leaf.
    #[error("invalid edit value at {path}: expected {expected}, got {got}")]
    InvalidEditValue {
        path: DocPath,
        expected: &'static str,
        got: &'static str,
    },
}
