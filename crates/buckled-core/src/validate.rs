//! Input validation shared by the HTTP surface and the session operations.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

static ZIP_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{5}(-\d{4})?$").unwrap());

/// Accepts `12345` and `12345-6789`.
pub fn validate_zip_code(zip: &str) -> Result<()> {
    if ZIP_CODE_RE.is_match(zip.trim()) {
        Ok(())
    } else {
        Err(Error::Validation(format!("Invalid ZIP code: {}", zip)))
    }
}
