use std::path::Path;

use crate::api::error::AppError;

const MAX_FILENAME_LENGTH: usize = 255;

/// Strips any path component and replaces characters that are unsafe in a
/// filename. Whitespace runs become dashes so storage keys stay readable.
pub fn sanitize_filename(filename: &str) -> Result<String, AppError> {
    // Get only the filename component (remove any path)
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if name.trim().is_empty() {
        return Err(AppError::Validation("Filename cannot be empty".to_string()));
    }

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path traversal attempt detected: {}", filename);
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_whitespace() {
                '-'
            } else if c.is_control()
                || c == '/'
                || c == '\\'
                || c == ':'
                || c == '*'
                || c == '?'
                || c == '"'
                || c == '<'
                || c == '>'
                || c == '|'
                || c == ';'
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    if sanitized.chars().all(|c| c == '-' || c == '_' || c == '.') {
        return Err(AppError::Validation("Filename cannot be empty".to_string()));
    }

    let truncated: String = sanitized.chars().take(MAX_FILENAME_LENGTH).collect();
    Ok(truncated)
}

pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), AppError> {
    if size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File exceeds the maximum allowed size of {} bytes",
            max_size
        )));
    }
    Ok(())
}

/// Clamps caller-supplied pagination to sane bounds.
pub fn normalize_paging(
    page: Option<u32>,
    page_size: Option<u32>,
    default_page_size: u32,
    max_page_size: u32,
) -> (u32, u32) {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size
        .unwrap_or(default_page_size)
        .clamp(1, max_page_size);
    (page, page_size)
}
