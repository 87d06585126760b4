/// Extensions media may be served with, and their content types
const MIME_TYPES: &[(&[&str], &str)] = &[
    (&["jpg", "jpeg", "jpe"], "image/jpeg"),
    (&["gif"], "image/gif"),
    (&["png"], "image/png"),
    (&["webp"], "image/webp"),
    (&["avif"], "image/avif"),
    (&["heic"], "image/heic"),
    (&["bmp"], "image/bmp"),
    (&["tif", "tiff"], "image/tiff"),
    (&["ico"], "image/x-icon"),
    (&["asf", "asx"], "video/x-ms-asf"),
    (&["wmv"], "video/x-ms-wmv"),
    (&["avi"], "video/avi"),
    (&["mov", "qt"], "video/quicktime"),
    (&["mpeg", "mpg", "mpe"], "video/mpeg"),
    (&["mp4", "m4v"], "video/mp4"),
    (&["ogv"], "video/ogg"),
    (&["webm"], "video/webm"),
    (&["mkv"], "video/x-matroska"),
    (&["3gp", "3gpp"], "video/3gpp"),
    (&["txt", "asc", "c", "cc", "h", "srt"], "text/plain"),
    (&["csv"], "text/csv"),
    (&["tsv"], "text/tab-separated-values"),
    (&["ics"], "text/calendar"),
    (&["rtx"], "text/richtext"),
    (&["css"], "text/css"),
    (&["htm", "html"], "text/html"),
    (&["vtt"], "text/vtt"),
    (&["mp3", "m4a", "m4b"], "audio/mpeg"),
    (&["aac"], "audio/aac"),
    (&["ra", "ram"], "audio/x-realaudio"),
    (&["wav"], "audio/wav"),
    (&["ogg", "oga"], "audio/ogg"),
    (&["flac"], "audio/flac"),
    (&["mid", "midi"], "audio/midi"),
    (&["wma"], "audio/x-ms-wma"),
    (&["js"], "application/javascript"),
    (&["pdf"], "application/pdf"),
    (&["tar"], "application/x-tar"),
    (&["zip"], "application/zip"),
    (&["gz", "gzip"], "application/x-gzip"),
    (&["rar"], "application/rar"),
    (&["7z"], "application/x-7z-compressed"),
    (&["rtf"], "application/rtf"),
    (&["doc"], "application/msword"),
    (&["pot", "pps", "ppt"], "application/vnd.ms-powerpoint"),
    (&["xla", "xls", "xlt", "xlw"], "application/vnd.ms-excel"),
    (
        &["docx"],
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    (
        &["xlsx"],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    (
        &["pptx"],
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    (&["odt"], "application/vnd.oasis.opendocument.text"),
    (&["ods"], "application/vnd.oasis.opendocument.spreadsheet"),
    (&["odp"], "application/vnd.oasis.opendocument.presentation"),
    (&["epub"], "application/epub+zip"),
];

/// Content type for a file extension, case-insensitive.
///
/// Unknown extensions yield `None`; such files are not served.
pub fn content_type(extension: &str) -> Option<&'static str> {
    let extension = extension.to_ascii_lowercase();
    MIME_TYPES
        .iter()
        .find(|(extensions, _)| extensions.contains(&extension.as_str()))
        .map(|(_, mime)| *mime)
}
