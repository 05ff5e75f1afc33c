use std::{io, path::Path};

use axum::{extract::Request, http::header};
use futures_util::TryStreamExt;
use multer::{Constraints, Field, Multipart, SizeLimit};
use tokio::{fs::File, io::AsyncWriteExt};

use crate::models::errors::{ToolkitError, UploadFailure};
use crate::models::response::UploadedFile;
use crate::services::content_sniffer::{sniff_content_type, SNIFF_LEN};
use crate::services::file_storage::create_dir_if_not_exist;
use crate::services::random::random_string;
use crate::Toolkit;

/// Length of the random stem given to renamed uploads
pub const RENAMED_FILE_LENGTH: usize = 25;

impl Toolkit {
    /// Stores the uploaded files and returns the first one.
    ///
    /// Fails with [`ToolkitError::NoFileUploaded`] when the form carries no
    /// file part.
    pub async fn upload_one_file(
        &self,
        request: Request,
        upload_dir: impl AsRef<Path>,
        rename: bool,
    ) -> Result<UploadedFile, ToolkitError> {
        let files = self
            .upload_files(request, upload_dir, rename)
            .await
            .map_err(|failure| failure.error)?;

        files.into_iter().next().ok_or(ToolkitError::NoFileUploaded)
    }

    /// Stores every file part of a `multipart/form-data` request in
    /// `upload_dir`, creating the directory first if needed.
    ///
    /// Each part is sniffed and checked against the allow-list before it is
    /// written. With `rename` set, files get a random name that keeps the
    /// original extension; otherwise the client's file name is used as is.
    /// Processing stops at the first failing part; files written before it
    /// stay on disk and are returned in the [`UploadFailure`].
    pub async fn upload_files(
        &self,
        request: Request,
        upload_dir: impl AsRef<Path>,
        rename: bool,
    ) -> Result<Vec<UploadedFile>, UploadFailure> {
        let upload_dir = upload_dir.as_ref();
        let mut uploaded = Vec::new();

        create_dir_if_not_exist(upload_dir).map_err(|e| UploadFailure::new(Vec::new(), e))?;

        let mut multipart = self
            .multipart(request)
            .map_err(|e| UploadFailure::new(Vec::new(), e))?;

        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => return Err(UploadFailure::new(uploaded, self.multipart_error(e))),
            };

            let Some(original) = field.file_name().map(base_name).filter(|n| !n.is_empty())
            else {
                tracing::debug!("Skipping non-file field: {:?}", field.name());
                continue;
            };

            match self.store_field(field, original, upload_dir, rename).await {
                Ok(file) => uploaded.push(file),
                Err(e) => {
                    tracing::warn!(
                        "Upload aborted after {} stored file(s): {}",
                        uploaded.len(),
                        e
                    );
                    return Err(UploadFailure::new(uploaded, e));
                }
            }
        }

        Ok(uploaded)
    }

    fn multipart(&self, request: Request) -> Result<Multipart<'static>, ToolkitError> {
        let boundary = request
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .ok_or_else(|| ToolkitError::invalid_multipart("missing content type"))
            .and_then(|ct| {
                multer::parse_boundary(ct).map_err(|e| ToolkitError::invalid_multipart(e.to_string()))
            })?;

        let stream = request
            .into_body()
            .into_data_stream()
            .map_err(io::Error::other);

        let constraints = Constraints::new()
            .size_limit(SizeLimit::new().whole_stream(self.config().max_upload_size));

        Ok(Multipart::with_constraints(stream, boundary, constraints))
    }

    fn multipart_error(&self, err: multer::Error) -> ToolkitError {
        match err {
            multer::Error::StreamSizeExceeded { limit } => ToolkitError::payload_too_large(limit),
            other => ToolkitError::invalid_multipart(other.to_string()),
        }
    }

    async fn store_field(
        &self,
        mut field: Field<'static>,
        original: String,
        upload_dir: &Path,
        rename: bool,
    ) -> Result<UploadedFile, ToolkitError> {
        // Buffer the leading bytes for sniffing; they are written out first,
        // so the stored copy is complete.
        let mut head = Vec::with_capacity(SNIFF_LEN);
        while head.len() < SNIFF_LEN {
            match field.chunk().await.map_err(|e| self.multipart_error(e))? {
                Some(chunk) => head.extend_from_slice(&chunk),
                None => break,
            }
        }

        if head.is_empty() {
            return Err(ToolkitError::empty_file(original));
        }

        let detected = sniff_content_type(&head);
        if !self.config().is_type_allowed(detected) {
            tracing::warn!("Rejected upload {:?} with type {}", original, detected);
            return Err(ToolkitError::disallowed_file_type(detected));
        }

        let new_file_name = if rename {
            format!("{}{}", random_string(RENAMED_FILE_LENGTH), extension_of(&original))
        } else {
            original.clone()
        };

        let dest = upload_dir.join(&new_file_name);
        let outfile = File::create(&dest).await?;

        let file_size = match self.copy_field(&mut field, &head, outfile).await {
            Ok(size) => size,
            Err(e) => {
                // a half-written file is never reported, so it must not stay behind
                if let Err(remove_err) = tokio::fs::remove_file(&dest).await {
                    if remove_err.kind() != io::ErrorKind::NotFound {
                        tracing::warn!(
                            "Failed to remove partial upload {}: {}",
                            dest.display(),
                            remove_err
                        );
                    }
                }
                return Err(e);
            }
        };

        tracing::info!(
            "Stored upload {:?} as {} ({} bytes, {})",
            original,
            new_file_name,
            file_size,
            detected
        );

        Ok(UploadedFile {
            new_file_name,
            original_file_name: original,
            file_size,
        })
    }

    /// Writes `head` followed by the rest of the part, returning the byte count
    async fn copy_field(
        &self,
        field: &mut Field<'static>,
        head: &[u8],
        mut outfile: File,
    ) -> Result<u64, ToolkitError> {
        outfile.write_all(head).await?;
        let mut file_size = head.len() as u64;

        while let Some(chunk) = field.chunk().await.map_err(|e| self.multipart_error(e))? {
            outfile.write_all(&chunk).await?;
            file_size += chunk.len() as u64;
        }
        outfile.flush().await?;

        Ok(file_size)
    }
}

/// Final path component of a client supplied file name
fn base_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Extension including the leading dot, or empty
fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}
