use url::Url;

/// Extensions of downloadable documents: recorded as leaf pages, never fetched
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx"];

/// Extensions of binary assets: ignored entirely
const ASSET_EXTENSIONS: &[&str] = &[
    // Images
    "jpg", "jpeg", "png", "gif", "webp", "svg", "bmp", "ico", "avif", "tif", "tiff",
    // Scripts and styles
    "css", "js", "mjs",
    // Fonts
    "woff", "woff2", "ttf", "otf", "eot",
    // Archives
    "zip", "rar", "tar", "gz", "tgz", "bz2", "xz", "7z",
    // Media
    "mp4", "mp3", "webm", "wav", "ogg", "mov", "avi", "m4a",
];

/// What a link target is, judged by its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// An ordinary page that may be crawled
    Page,
    /// A downloadable document (leaf node)
    Document,
    /// A binary asset that is neither crawled nor recorded
    Asset,
}

/// Classifies a URL by the extension of its last path segment
///
/// The query string is not part of the path, so `report.pdf?v=2` is still a
/// document.
pub fn classify(url: &Url) -> FileKind {
    match extension(url) {
        Some(ext) if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) => FileKind::Document,
        Some(ext) if ASSET_EXTENSIONS.contains(&ext.as_str()) => FileKind::Asset,
        _ => FileKind::Page,
    }
}

/// Returns true if the URL points at a downloadable document
pub fn is_document(url: &Url) -> bool {
    classify(url) == FileKind::Document
}

/// Returns true if the URL points at an image, script, style, font, archive or media file
pub fn is_ignored_asset(url: &Url) -> bool {
    classify(url) == FileKind::Asset
}

/// Last path segment of a URL, if it has a non-empty one
pub fn file_name(url: &Url) -> Option<&str> {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
}

fn extension(url: &Url) -> Option<String> {
    let name = file_name(url)?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
