use std::path::Path;

use reqwest::multipart::Part;

use crate::error::{MarketClientError, MarketClientResult};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Файл для multipart-загрузки (фото объявления, аватар, фото для верификации).
pub struct Upload {
    /// Имя файла.
    pub file_name: String,
    /// MIME-тип.
    pub mime: String,
    /// Содержимое.
    pub bytes: Vec<u8>,
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

impl Upload {
    /// Загрузка из байтов в памяти.
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Читает файл с диска; MIME-тип определяется по расширению.
    pub fn from_path(path: impl AsRef<Path>) -> MarketClientResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self {
            file_name,
            mime: mime_for(path).to_string(),
            bytes,
        })
    }

    pub(crate) fn into_part(self) -> MarketClientResult<Part> {
        Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.mime)
            .map_err(|err| MarketClientError::InvalidRequest(format!("invalid mime type: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_is_guessed_from_extension() {
        assert_eq!(mime_for(Path::new("a/photo.JPG")), "image/jpeg");
        assert_eq!(mime_for(Path::new("b.png")), "image/png");
        assert_eq!(mime_for(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn from_path_reports_missing_file() {
        let err = Upload::from_path("definitely/missing/file.png").expect_err("must fail");
        assert!(matches!(err, MarketClientError::Io(_)));
    }

    #[test]
    fn into_part_accepts_known_mime() {
        let upload = Upload::new("a.png", "image/png", vec![1, 2, 3]);
        assert!(upload.into_part().is_ok());
    }
}
