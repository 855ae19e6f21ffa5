//! Object path helpers shared by the blob stores.

use mediastore_core::error::AppError;
use mediastore_core::result::AppResult;

/// Normalize an object path, rejecting traversal and empty segments.
pub(crate) fn clean_path(path: &str) -> AppResult<String> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(AppError::validation("Object path is empty"));
    }
    for segment in trimmed.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
            return Err(AppError::validation(format!("Invalid object path: '{path}'")));
        }
    }
    Ok(trimmed.to_string())
}

/// Join a base URL and an object path, percent-encoding each segment.
pub(crate) fn join_public_url(base: &str, path: &str) -> String {
    let encoded: Vec<String> = path
        .trim_matches('/')
        .split('/')
        .map(encode_segment)
        .collect();
    format!("{}/{}", base.trim_end_matches('/'), encoded.join("/"))
}

fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
