//! Validation functions
//!

use snafu::prelude::*;

use crate::{
    Result,
    config::{VALIDATION_BODY_MAX_LEN, VALIDATION_ID_MAX_LEN, VALIDATION_NOTE_MAX_LEN},
    prelude::*,
};

/// Validation limits for sanity checking requests before they are sent.
/// A too-strict limit may cause the program to fail with legitimate inputs, so
/// the defaults are loose. All limits can be adjusted at client creation time.
#[derive(Debug, Clone)]
pub struct ValidationLimits {
    /// max length of a note in bytes
    pub note_max_len: u64,

    /// max length of an item id in bytes
    pub id_max_len: u64,

    /// max size of a request body in bytes
    pub body_max_len: u64,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        ValidationLimits {
            // (default: 10_000 bytes)
            note_max_len: VALIDATION_NOTE_MAX_LEN,
            // (default: 200 bytes)
            id_max_len: VALIDATION_ID_MAX_LEN,
            // (default: 64 KiB)
            body_max_len: VALIDATION_BODY_MAX_LEN,
        }
    }
}

impl ValidationLimits {
    /// Checks an item id: not empty, no path separators, length within range
    pub fn validate_id(&self, id: &ItemId) -> Result<()> {
        let id = id.as_str();
        ensure!(
            !id.is_empty(),
            ValidationSnafu {
                message: "item id cannot be empty",
            }
        );
        ensure!(
            id.len() as u64 <= self.id_max_len,
            ValidationSnafu {
                message: format!(
                    "item id too long: {} bytes (max: {})",
                    id.len(),
                    self.id_max_len
                ),
            }
        );
        ensure!(
            !id.contains(['/', '?', '#']),
            ValidationSnafu {
                message: format!("item id contains reserved characters: {id}"),
            }
        );
        Ok(())
    }

    pub fn validate_note(&self, note: &str) -> Result<()> {
        ensure!(
            note.len() as u64 <= self.note_max_len,
            ValidationSnafu {
                message: format!(
                    "note too long: {} bytes (max: {})",
                    note.len(),
                    self.note_max_len
                ),
            }
        );
        Ok(())
    }

    pub(crate) fn validate_body(&self, body: &[u8], description: &str) -> Result<()> {
        ensure!(
            body.len() as u64 <= self.body_max_len,
            ValidationSnafu {
                message: format!(
                    "{description} body too large: {} bytes (max: {})",
                    body.len(),
                    self.body_max_len
                ),
            }
        );
        Ok(())
    }
}
