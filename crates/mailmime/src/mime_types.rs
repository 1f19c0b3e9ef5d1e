//! MIME types by file-name extension.

/// Looks up the base type for a file name by its extension.
///
/// Returns `(primary, sub)` for known extensions, `None` otherwise.
#[must_use]
pub fn guess_from_file_name(file_name: &str) -> Option<(&'static str, &'static str)> {
    let (_, ext) = file_name.trim().trim_matches('"').rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    let base = match ext.as_str() {
        "txt" | "text" | "log" => ("text", "plain"),
        "htm" | "html" => ("text", "html"),
        "css" => ("text", "css"),
        "csv" => ("text", "csv"),
        "ics" | "ical" => ("text", "calendar"),
        "vcf" | "vcard" => ("text", "vcard"),
        "xml" => ("text", "xml"),
        "eml" => ("message", "rfc822"),
        "jpg" | "jpeg" | "jpe" => ("image", "jpeg"),
        "png" => ("image", "png"),
        "gif" => ("image", "gif"),
        "bmp" => ("image", "bmp"),
        "tif" | "tiff" => ("image", "tiff"),
        "webp" => ("image", "webp"),
        "svg" => ("image", "svg+xml"),
        "mp3" => ("audio", "mpeg"),
        "wav" => ("audio", "wav"),
        "ogg" => ("audio", "ogg"),
        "mp4" => ("video", "mp4"),
        "mpg" | "mpeg" => ("video", "mpeg"),
        "mov" => ("video", "quicktime"),
        "webm" => ("video", "webm"),
        "pdf" => ("application", "pdf"),
        "zip" => ("application", "zip"),
        "gz" | "tgz" => ("application", "gzip"),
        "json" => ("application", "json"),
        "js" => ("application", "javascript"),
        "rtf" => ("application", "rtf"),
        "doc" | "dot" => ("application", "msword"),
        "xls" => ("application", "vnd.ms-excel"),
        "ppt" => ("application", "vnd.ms-powerpoint"),
        "docx" => (
            "application",
            "vnd.openxmlformats-officedocument.wordprocessingml.document",
        ),
        "xlsx" => (
            "application",
            "vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ),
        "pptx" => (
            "application",
            "vnd.openxmlformats-officedocument.presentationml.presentation",
        ),
        "odt" => ("application", "vnd.oasis.opendocument.text"),
        "ods" => ("application", "vnd.oasis.opendocument.spreadsheet"),
        "p7s" => ("application", "pkcs7-signature"),
        "asc" | "sig" => ("application", "pgp-signature"),
        _ => return None,
    };
    Some(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(guess_from_file_name("report.PDF"), Some(("application", "pdf")));
        assert_eq!(guess_from_file_name("photo.jpeg"), Some(("image", "jpeg")));
        assert_eq!(guess_from_file_name("\"notes.txt\""), Some(("text", "plain")));
        assert_eq!(guess_from_file_name("archive.tar.gz"), Some(("application", "gzip")));
    }

    #[test]
    fn test_unknown() {
        assert_eq!(guess_from_file_name("README"), None);
        assert_eq!(guess_from_file_name("data.unknownext"), None);
        assert_eq!(guess_from_file_name(""), None);
    }
}
