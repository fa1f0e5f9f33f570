//! Pure transformations used by the pipeline.

/// Trailing path segment of a download URL, without query or fragment.
pub fn url_filename(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let path = &url[..end];
    path.rsplit('/').next().unwrap_or(path)
}

/// The `filename=` value of a `Content-Disposition` header.
///
/// Surrounding quotes and any following `;`-separated parameters are dropped.
pub fn disposition_filename(header: &str) -> Option<String> {
    let lowered = header.to_ascii_lowercase();
    let start = lowered.find("filename=")? + "filename=".len();

    let value = header[start..].split(';').next()?.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
        .trim();

    (!value.is_empty()).then(|| value.to_string())
}

/// Whether `status` is in the 2xx range.
pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}
