use std::{fs, io, path::Path};

use crate::models::errors::ToolkitError;

/// Permission bits for directories created by the toolkit
pub const DIR_MODE: u32 = 0o755;

/// Creates `path` and any missing parents. An existing path is left alone,
/// whether or not it is a directory.
pub fn create_dir_if_not_exist(path: impl AsRef<Path>) -> Result<(), ToolkitError> {
    let path = path.as_ref();

    match fs::metadata(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let mut builder = fs::DirBuilder::new();
            builder.recursive(true);

            #[cfg(unix)]
            {
                use std::os::unix::fs::DirBuilderExt;
                builder.mode(DIR_MODE);
            }

            builder.create(path).map_err(|e| {
                tracing::error!("Failed to create directory {}: {}", path.display(), e);
                ToolkitError::Io(e)
            })?;

            tracing::debug!("Created directory: {}", path.display());
            Ok(())
        }
        Err(e) => Err(ToolkitError::Io(e)),
    }
}
