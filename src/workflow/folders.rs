use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

pub const OUTPUT_FILE: &str = "output.txt";

/// Create and return `<root>/workflowN` for the smallest unused N >= 1.
///
/// The root is created if missing. A name that already exists, as a file or
/// a directory, is skipped.
pub async fn next_task_folder(root: &Path) -> Result<PathBuf> {
    fs::create_dir_all(root)
        .await
        .with_context(|| format!("Failed to create {}", root.display()))?;

    let mut counter: u32 = 1;
    loop {
        let folder = root.join(format!("workflow{}", counter));
        match fs::create_dir(&folder).await {
            Ok(()) => {
                debug!("Created task folder {}", folder.display());
                return Ok(folder);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => counter += 1,
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to create {}", folder.display()))
            }
        }
    }
}

/// Write raw agent output into a fresh task folder, returning the file path
pub async fn save_output(root: &Path, output: &str) -> Result<PathBuf> {
    let folder = next_task_folder(root).await?;
    let path = folder.join(OUTPUT_FILE);
    fs::write(&path, output)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn folders_are_numbered_sequentially() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("extracted_data");

        let first = next_task_folder(&root).await.unwrap();
        let second = next_task_folder(&root).await.unwrap();

        assert_eq!(first, root.join("workflow1"));
        assert_eq!(second, root.join("workflow2"));
        assert!(first.is_dir() && second.is_dir());
    }

    #[tokio::test]
    async fn gaps_are_filled_first() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("workflow1")).unwrap();
        std::fs::write(dir.path().join("workflow2"), "not a folder").unwrap();
        std::fs::create_dir(dir.path().join("workflow4")).unwrap();

        assert_eq!(next_task_folder(dir.path()).await.unwrap(), dir.path().join("workflow3"));
        assert_eq!(next_task_folder(dir.path()).await.unwrap(), dir.path().join("workflow5"));
    }

    #[tokio::test]
    async fn output_is_saved_verbatim() {
        let dir = tempfile::tempdir().unwrap();

        let path = save_output(dir.path(), "Task: find flats\nSteps: 2\n")
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("workflow1").join("output.txt"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "Task: find flats\nSteps: 2\n");
    }
}
