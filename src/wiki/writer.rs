use std::io;
use std::path::Path;

/// Replace `path` with `content` through a sibling temp file and a rename.
///
/// Readers see either the previous file or the complete new one. The temp
/// file is removed if the rename fails.
pub async fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;

    let tmp = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));
    tokio::fs::write(&tmp, content).await?;

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}
