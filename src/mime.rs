//! Best-guess media-type resolution from file names.
//!
//! This table backs the default content-type resolver of
//! [`FileHandler::serving`](crate::FileHandler::serving). A resolver is plain
//! configuration: handlers take one explicitly at construction, so embedders
//! can swap this table out without touching any global state.

/// Returns the media type conventionally associated with `name`'s extension,
/// or `None` when the extension is unknown or absent.
///
/// # Example
///
/// ```rust
/// use kiosk::mime::media_type;
/// assert_eq!(media_type("index.html"), Some("text/html"));
/// assert_eq!(media_type("video.mp4"), Some("video/mp4"));
/// assert_eq!(media_type("README"), None);
/// ```
pub fn media_type(name: &str) -> Option<&'static str> {
    let extension = name.rsplit_once('.').map(|(_, ext)| ext)?;
    let media_type = match extension.to_ascii_lowercase().as_str() {
        // text
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "txt" | "md" => "text/plain",
        "xml" => "application/xml",
        "csv" => "text/csv",

        // scripts and data
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "wasm" => "application/wasm",

        // images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",

        // audio / video
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogg" | "ogv" => "video/ogg",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",

        // fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",

        // archives and documents
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",
        "tar" => "application/x-tar",

        _ => return None,
    };
    Some(media_type)
}
