//! Multipart form collection and uploaded-file rules.
//!
//! Handlers drain the axum `Multipart` extractor into a `MultipartForm`, which
//! works the same for POST and PUT bodies. File types are detected from the
//! leading bytes of the upload; the client's declared content type is ignored.

use std::collections::{HashMap, HashSet};

use axum::body::Bytes;
use axum::extract::Multipart;

use crate::error::{AppError, ValidationErrors};

/// An uploaded file part.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Text fields and files of a multipart body. Later parts with the same name win.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
    binary: HashSet<String>,
}

impl MultipartForm {
    /// Read every part of the body.
    ///
    /// A broken body (bad boundary, truncated part) is reported as
    /// `422 Invalid form data`.
    pub async fn collect(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            tracing::debug!("Rejecting multipart body: {}", e);
            AppError::unprocessable("Invalid form data")
        })? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let file_name = field.file_name().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|_| AppError::unprocessable("Invalid form data"))?;

            match file_name {
                Some(file_name) => form.insert_file(name, file_name, bytes),
                None => form.insert_text(name, bytes),
            }
        }

        Ok(form)
    }

    pub fn insert_text(&mut self, name: String, bytes: Bytes) {
        match String::from_utf8(bytes.to_vec()) {
            Ok(text) => {
                self.binary.remove(&name);
                self.fields.insert(name, text);
            }
            Err(_) => {
                self.fields.remove(&name);
                self.binary.insert(name);
            }
        }
    }

    pub fn insert_file(&mut self, name: String, file_name: String, bytes: Bytes) {
        self.files.insert(name, UploadedFile { file_name, bytes });
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// A text part that was sent but is not valid UTF-8.
    pub fn is_binary(&self, name: &str) -> bool {
        self.binary.contains(name)
    }

    /// Whether a part with this name was sent as a text value (valid or not).
    pub fn has_text(&self, name: &str) -> bool {
        self.fields.contains_key(name) || self.binary.contains(name)
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.files.is_empty() && self.binary.is_empty()
    }
}

/// A file type recognized from its magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedType {
    pub mime: &'static str,
    pub extension: &'static str,
}

impl DetectedType {
    pub const JPEG: DetectedType = DetectedType {
        mime: "image/jpeg",
        extension: "jpg",
    };
    pub const PNG: DetectedType = DetectedType {
        mime: "image/png",
        extension: "png",
    };
    pub const MP4: DetectedType = DetectedType {
        mime: "video/mp4",
        extension: "mp4",
    };
    pub const MOV: DetectedType = DetectedType {
        mime: "video/quicktime",
        extension: "mov",
    };

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }

    /// Stored `type` / `banner_type` column value.
    pub fn kind(&self) -> &'static str {
        if self.mime.contains("video") {
            "video"
        } else {
            "image"
        }
    }

    /// Extensions that the type may be listed under in a rule.
    fn aliases(&self) -> &'static [&'static str] {
        match self.extension {
            "jpg" => &["jpg", "jpeg"],
            "png" => &["png"],
            "mp4" => &["mp4"],
            "mov" => &["mov"],
            _ => &[],
        }
    }
}

/// `ftyp` major brands recognised as MP4 video.
const MP4_BRANDS: &[&[u8]] = &[
    b"isom", b"iso2", b"iso3", b"iso4", b"iso5", b"iso6", b"mp41", b"mp42", b"avc1", b"M4V ",
    b"dash",
];

/// Detect JPEG, PNG, MP4 and QuickTime content.
pub fn detect_type(bytes: &[u8]) -> Option<DetectedType> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(DetectedType::JPEG);
    }
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(DetectedType::PNG);
    }
    if bytes.len() >= 12 {
        let box_type = &bytes[4..8];
        if box_type == b"ftyp" {
            return match &bytes[8..12] {
                b"qt  " => Some(DetectedType::MOV),
                brand if MP4_BRANDS.contains(&brand) => Some(DetectedType::MP4),
                // HEIC, AVIF, 3GP and other ISO-BMFF formats.
                _ => None,
            };
        }
        // Older QuickTime files start directly with a movie or data atom.
        if matches!(box_type, b"moov" | b"mdat" | b"wide" | b"free" | b"skip") {
            return Some(DetectedType::MOV);
        }
    }
    None
}

/// Allowed types and size limit for one upload field.
#[derive(Debug, Clone, Copy)]
pub struct FileRule {
    pub extensions: &'static [&'static str],
    pub max_kilobytes: usize,
    /// Reject anything that is not an image before checking extensions.
    pub image_only: bool,
}

/// Page banners and media library files.
pub const MEDIA_FILE: FileRule = FileRule {
    extensions: &["jpg", "jpeg", "png", "mp4", "mov"],
    max_kilobytes: 10240,
    image_only: false,
};

/// Team member profile pictures.
pub const PROFILE_PICTURE: FileRule = FileRule {
    extensions: &["jpg", "jpeg", "png"],
    max_kilobytes: 2048,
    image_only: true,
};

impl FileRule {
    /// Check `file` against the rule, recording messages under `field`.
    ///
    /// Returns the detected type when the file is acceptable.
    pub fn check(
        &self,
        field: &str,
        file: &UploadedFile,
        errors: &mut ValidationErrors,
    ) -> Option<DetectedType> {
        let detected = detect_type(&file.bytes);
        let mut ok = true;

        if self.image_only && !detected.is_some_and(|t| t.is_image()) {
            errors.add(field, format!("The {} field must be an image.", human(field)));
            ok = false;
        }

        let allowed =
            detected.is_some_and(|t| t.aliases().iter().any(|ext| self.extensions.contains(ext)));
        if !allowed {
            errors.add(
                field,
                format!(
                    "The {} field must be a file of type: {}.",
                    human(field),
                    self.extensions.join(", ")
                ),
            );
            ok = false;
        }

        if file.size() > self.max_kilobytes * 1024 {
            errors.add(
                field,
                format!(
                    "The {} field must not be greater than {} kilobytes.",
                    human(field),
                    self.max_kilobytes
                ),
            );
            ok = false;
        }

        if ok { detected } else { None }
    }
}

/// `profile_picture` -> `profile picture`, as used in messages.
pub fn human(field: &str) -> String {
    field.replace('_', " ")
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn detects_supported_signatures() {
        assert_eq!(detect_type(&jpeg(16).bytes), Some(DetectedType::JPEG));
        assert_eq!(detect_type(&mp4().bytes), Some(DetectedType::MP4));

        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        assert_eq!(detect_type(&png), Some(DetectedType::PNG));

        let mut mov = vec![0, 0, 0, 0x14];
        mov.extend_from_slice(b"ftypqt  ");
        assert_eq!(detect_type(&mov), Some(DetectedType::MOV));

        assert_eq!(detect_type(b"plain text"), None);
        assert_eq!(detect_type(b""), None);
    }

    #[test]
    fn still_image_containers_are_not_video() {
        for brand in [b"heic", b"avif", b"mif1", b"3gp4"] {
            let mut bytes = vec![0, 0, 0, 0x18];
            bytes.extend_from_slice(b"ftyp");
            bytes.extend_from_slice(brand);
            bytes.resize(64, 0);
            assert_eq!(detect_type(&bytes), None, "{}", String::from_utf8_lossy(brand));

            let file = UploadedFile {
                file_name: "photo.heic".to_string(),
                bytes: Bytes::from(bytes),
            };
            let mut errors = ValidationErrors::new();
            assert!(MEDIA_FILE.check("banner", &file, &mut errors).is_none());
            assert_eq!(
                errors.get("banner").unwrap(),
                ["The banner field must be a file of type: jpg, jpeg, png, mp4, mov."]
            );
        }

        let mut m4v = vec![0, 0, 0, 0x18];
        m4v.extend_from_slice(b"ftypM4V ");
        assert_eq!(detect_type(&m4v), Some(DetectedType::MP4));
    }

    #[test]
    fn kind_follows_mime() {
        assert_eq!(DetectedType::MOV.kind(), "video");
        assert_eq!(DetectedType::PNG.kind(), "image");
    }

    #[test]
    fn media_rule_accepts_video() {
        let mut errors = ValidationErrors::new();
        let detected = MEDIA_FILE.check("file", &mp4(), &mut errors);

        assert_eq!(detected, Some(DetectedType::MP4));
        assert!(errors.is_empty());
    }

    #[test]
    fn media_rule_rejects_text_files() {
        let mut errors = ValidationErrors::new();
        assert!(MEDIA_FILE.check("file", &text(), &mut errors).is_none());
        assert_eq!(
            errors.get("file").unwrap(),
            ["The file field must be a file of type: jpg, jpeg, png, mp4, mov."]
        );
    }

    #[test]
    fn media_rule_rejects_oversized_files() {
        let mut errors = ValidationErrors::new();
        let big = jpeg(10240 * 1024 + 1);

        assert!(MEDIA_FILE.check("banner", &big, &mut errors).is_none());
        assert_eq!(
            errors.get("banner").unwrap(),
            ["The banner field must not be greater than 10240 kilobytes."]
        );
    }

    #[test]
    fn profile_picture_rule_is_image_only() {
        let mut errors = ValidationErrors::new();
        assert!(PROFILE_PICTURE.check("profile_picture", &mp4(), &mut errors).is_none());

        let messages = errors.get("profile_picture").unwrap();
        assert_eq!(messages[0], "The profile picture field must be an image.");
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn profile_picture_size_limit_is_two_megabytes() {
        let mut errors = ValidationErrors::new();
        assert!(PROFILE_PICTURE.check("profile_picture", &jpeg(2048 * 1024), &mut errors).is_some());
        assert!(PROFILE_PICTURE.check("profile_picture", &jpeg(2048 * 1024 + 1), &mut errors).is_none());
    }

    #[test]
    fn form_tracks_binary_text_parts() {
        let mut form = MultipartForm::default();
        form.insert_text("title".into(), Bytes::from_static(b"About us"));
        form.insert_text("content".into(), Bytes::from_static(&[0xC3, 0x28]));

        assert_eq!(form.text("title"), Some("About us"));
        assert_eq!(form.text("content"), None);
        assert!(form.is_binary("content"));
        assert!(form.has_text("content"));
        assert!(!form.is_empty());
    }
}
