use anyhow::Context;
use finsearch_core::attachments::FileDescriptor;
use std::path::Path;

/// Stats a local file into the descriptor the intake validates. The MIME
/// type is left to be guessed from the extension.
pub fn describe(path: &Path) -> anyhow::Result<FileDescriptor> {
    let metadata =
        std::fs::metadata(path).with_context(|| format!("stat {} failed", path.display()))?;
    anyhow::ensure!(metadata.is_file(), "{} is not a regular file", path.display());

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} has no usable file name", path.display()))?
        .to_string();

    Ok(FileDescriptor {
        name,
        mime_type: None,
        size_bytes: metadata.len(),
    })
}
