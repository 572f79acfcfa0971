use super::FileError;
use crate::storage::models::normalize_timestamp;

/// File types accepted for upload, with the content type each is stored as.
const ACCEPTED_TYPES: [(&str, &str); 4] = [
    ("pdf", "application/pdf"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
];

/// Check that `file_name` is `NAME.TYPE` with an accepted type and return its
/// content type.
pub fn validate_file_name(file_name: &str) -> Result<&'static str, FileError> {
    let malformed = || FileError::Validation(format!("Malformed file name: '{file_name}'"));

    let (stem, extension) = file_name.split_once('.').ok_or_else(malformed)?;
    if stem.is_empty() || extension.contains('.') || file_name.contains('/') {
        return Err(malformed());
    }

    ACCEPTED_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, content_type)| *content_type)
        .ok_or_else(|| {
            FileError::Validation(format!(
                "Unsupported file type '{extension}' (accepted: pdf, jpeg, jpg, png)"
            ))
        })
}

pub fn validate_owner_id(owner_id: &str) -> Result<(), FileError> {
    if owner_id.trim().is_empty() {
        return Err(FileError::Validation("ownerId must not be empty".to_string()));
    }
    if owner_id == "." || owner_id == ".." {
        return Err(FileError::Validation(format!(
            "ownerId '{owner_id}' is not a valid owner"
        )));
    }
    if owner_id.contains('/') || owner_id.contains('\\') || owner_id.contains('\0') {
        return Err(FileError::Validation(format!(
            "ownerId '{owner_id}' contains a reserved character"
        )));
    }
    Ok(())
}

/// Canonical form of an optional request timestamp, or `default` when absent.
pub fn timestamp_or(field: &str, raw: Option<&str>, default: &str) -> Result<String, FileError> {
    match raw {
        None => Ok(default.to_string()),
        Some(raw) => normalize_timestamp(raw)
            .map_err(|e| FileError::Validation(format!("{field} is not an RFC 3339 timestamp: {e}"))),
    }
}
