use std::io;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

/// Writes `bytes` to `target` through a sibling `.partial` file so a cut-off
/// write never leaves a truncated texture at `target`.
pub async fn write_cape(target: &Path, bytes: &[u8]) -> io::Result<()> {
    let partial = partial_path(target);
    let result = async {
        let mut file = tokio::fs::File::create(&partial).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&partial, target).await
    }
    .await;
    if result.is_err() {
        let _ = tokio::fs::remove_file(&partial).await;
    }
    result
}

fn partial_path(target: &Path) -> PathBuf {
    target.with_extension(format!(
        "{}partial",
        target
            .extension()
            .map(|ext| format!("{}.", ext.to_string_lossy()))
            .unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn writes_bytes_and_leaves_no_partial() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("free/free_1.png");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();

        write_cape(&target, b"png-bytes").await.unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"png-bytes");
        assert!(!dir.path().join("free/free_1.png.partial").exists());
    }

    #[tokio::test]
    async fn overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("custom_0.png");
        std::fs::write(&target, b"old").unwrap();

        write_cape(&target, b"new").await.unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"new");
    }

    #[test]
    fn partial_path_keeps_extension() {
        assert_eq!(
            partial_path(Path::new("/capes/free/free_1.png")),
            PathBuf::from("/capes/free/free_1.png.partial")
        );
    }
}
