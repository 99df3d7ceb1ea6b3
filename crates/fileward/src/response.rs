//! HTTP responses for stored files and errors
//!
//! Handlers return `Result<Response, HttpFileError>`; any [`FileError`] is
//! converted with `?` and rendered as a JSON [`ErrorResponse`].

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use fileward_core::{ErrorMetadata, FileError, FileResult, LogLevel, Owner};
use serde::Serialize;
use std::path::Path;
use tokio_util::io::ReaderStream;

use crate::manager::AttachmentManager;

impl AttachmentManager {
    /// Stream a stored file inline
    pub async fn show_file<O: Owner + ?Sized>(
        &self,
        owner: &O,
        variant: Option<&str>,
        name: Option<&str>,
    ) -> FileResult<Response> {
        let path = self.existing_file(owner, variant, name).await?;
        file_response(&path, None).await
    }

    /// Stream a stored file as a download
    pub async fn send_file<O: Owner + ?Sized>(
        &self,
        owner: &O,
        variant: Option<&str>,
        name: Option<&str>,
    ) -> FileResult<Response> {
        let path = self.existing_file(owner, variant, name).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        file_response(&path, Some(&file_name)).await
    }

    async fn existing_file<O: Owner + ?Sized>(
        &self,
        owner: &O,
        variant: Option<&str>,
        name: Option<&str>,
    ) -> FileResult<std::path::PathBuf> {
        let path = match self.file_path(owner, variant, name) {
            Ok(path) => path,
            Err(FileError::NoFile) => {
                return Err(FileError::NotFound(name.unwrap_or_default().to_string()))
            }
            Err(e) => return Err(e),
        };

        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            let shown = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            return Err(FileError::NotFound(shown));
        }
        Ok(path)
    }
}

async fn file_response(path: &Path, attachment: Option<&str>) -> FileResult<Response> {
    let file = tokio::fs::File::open(path).await?;
    let length = file.metadata().await?.len();
    let content_type = mime_guess::from_path(path).first_or_octet_stream();

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CONTENT_LENGTH, length);
    if let Some(file_name) = attachment {
        builder = builder.header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        );
    }

    builder
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| FileError::Io(std::io::Error::other(e)))
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code
    pub code: String,
}

/// Wrapper so [`FileError`] can implement axum's `IntoResponse`
#[derive(Debug)]
pub struct HttpFileError(pub FileError);

impl From<FileError> for HttpFileError {
    fn from(err: FileError) -> Self {
        HttpFileError(err)
    }
}

fn log_error(error: &FileError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

impl IntoResponse for HttpFileError {
    fn into_response(self) -> Response {
        let error = &self.0;
        let status =
            StatusCode::from_u16(error.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(error);

        // Sensitive errors never leak storage paths
        let body = if error.is_sensitive() {
            ErrorResponse {
                error: error.client_message(),
                details: None,
                error_type: None,
                code: error.error_code().to_string(),
            }
        } else {
            ErrorResponse {
                error: error.client_message(),
                details: Some(error.to_string()),
                error_type: Some(error.error_type().to_string()),
                code: error.error_code().to_string(),
            }
        };

        (status, Json(body)).into_response()
    }
}
