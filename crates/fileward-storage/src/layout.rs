//! Filesystem layout of an owner's files.
//!
//! Layout: `{root}/{field}/{name}` for the primary file and
//! `{root}/{field}_{variant}/{name}` for each variant. Names are sanitized
//! before they touch the filesystem, so a client-supplied name can never
//! leave its directory.

use std::path::PathBuf;

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Strip everything but `[A-Za-z0-9_-]` from a directory component.
pub fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .filter(|&c| is_word_char(c) || c == '-')
        .collect()
}

/// Strip everything but `[A-Za-z0-9_.-]` from a filename and keep only the
/// last dot, so the result has at most one extension and no `..`.
///
/// A name made only of dots sanitizes to the empty string.
pub fn sanitize_filename(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|&c| is_word_char(c) || c == '-' || c == '.')
        .collect();

    let sanitized = match kept.rfind('.') {
        Some(pos) => {
            let (stem, extension) = kept.split_at(pos);
            format!("{}{}", stem.replace('.', ""), extension)
        }
        None => kept,
    };

    if sanitized == "." {
        String::new()
    } else {
        sanitized
    }
}

/// Leading `<digits>_` number of a stored filename
pub fn parse_file_number(name: &str) -> Option<u64> {
    let (digits, _) = name.split_once('_')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Stored name of the `number`-th upload
pub fn numbered_filename(number: u64, original: &str) -> String {
    format!("{}_{}", number, sanitize_filename(original))
}

/// Directory name of the primary field or one of its variants
pub fn directory_name(field: &str, variant: Option<&str>) -> String {
    match variant {
        Some(variant) if !variant.is_empty() => {
            format!("{}_{}", field, sanitize_component(variant))
        }
        _ => field.to_string(),
    }
}

/// Paths of one owner's files under a resolved root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLayout {
    root: PathBuf,
    field: String,
}

impl FileLayout {
    pub fn new(root: impl Into<PathBuf>, field: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            field: field.into(),
        }
    }

    pub fn directory(&self, variant: Option<&str>) -> PathBuf {
        self.root.join(directory_name(&self.field, variant))
    }

    /// Path of `name` in the primary or variant directory; an empty (or
    /// fully stripped) name yields the directory itself
    pub fn file(&self, variant: Option<&str>, name: &str) -> PathBuf {
        let dir = self.directory(variant);
        let name = sanitize_filename(name);
        if name.is_empty() {
            dir
        } else {
            dir.join(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_strips_traversal() {
        assert_eq!(sanitize_filename("../evil.png"), "evil.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_filename("my photo (1).jpg"), "myphoto1.jpg");
        assert_eq!(sanitize_filename("archive.tar.gz"), "archivetar.gz");
        assert_eq!(sanitize_filename("1_photo.png"), "1_photo.png");
        assert_eq!(sanitize_filename(".."), "");
        assert_eq!(sanitize_filename(""), "");
    }

    #[test]
    fn test_sanitize_filename_is_idempotent() {
        for input in [
            "../evil.png",
            "a.b.c.d",
            "weird name!.PNG",
            "...",
            "x.",
            "ünïcödé.png",
            "1_already-clean.jpg",
        ] {
            let once = sanitize_filename(input);
            assert_eq!(sanitize_filename(&once), once, "input: {input}");
            assert!(once.matches('.').count() <= 1, "input: {input}");
        }
    }

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component("thumb-1"), "thumb-1");
        assert_eq!(sanitize_component("../thumb/1"), "thumb1");
        assert_eq!(sanitize_component("a.b"), "ab");
    }

    #[test]
    fn test_parse_file_number() {
        assert_eq!(parse_file_number("3_x.png"), Some(3));
        assert_eq!(parse_file_number("12_a_b.png"), Some(12));
        assert_eq!(parse_file_number("x_3.png"), None);
        assert_eq!(parse_file_number("_x.png"), None);
        assert_eq!(parse_file_number("3x.png"), None);
        assert_eq!(parse_file_number("photo.png"), None);
    }

    #[test]
    fn test_numbered_filename_sanitizes_client_name() {
        assert_eq!(numbered_filename(1, "photo.png"), "1_photo.png");
        assert_eq!(numbered_filename(4, "../my pic.png"), "4_mypic.png");
    }

    #[test]
    fn test_layout_paths() {
        let layout = FileLayout::new("/srv/files/post/1", "image");
        assert_eq!(
            layout.file(None, "1_a.png"),
            PathBuf::from("/srv/files/post/1/image/1_a.png")
        );
        assert_eq!(
            layout.file(Some("thumb"), "1_a.png"),
            PathBuf::from("/srv/files/post/1/image_thumb/1_a.png")
        );
        assert_eq!(
            layout.file(Some("../thumb"), "../1_a.png"),
            PathBuf::from("/srv/files/post/1/image_thumb/1_a.png")
        );
        assert_eq!(
            layout.file(Some("thumb"), ""),
            PathBuf::from("/srv/files/post/1/image_thumb")
        );
        assert_eq!(layout.directory(Some("")), layout.directory(None));
    }
}
