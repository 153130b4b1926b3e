//! Filesystem [`ArtifactStore`] for decoded signature images.

use std::{
  io,
  path::{Path, PathBuf},
};

use clipdesk_core::signature::{ArtifactStore, SignatureImage, StoredArtifact};

/// Writes each artifact as a file directly under `dir`, creating `dir` on
/// first use.
pub struct FsArtifactStore {
  dir: PathBuf,
}

impl FsArtifactStore {
  pub fn new(dir: impl AsRef<Path>) -> Self { Self { dir: dir.as_ref().to_path_buf() } }

  pub fn dir(&self) -> &Path { &self.dir }
}

impl ArtifactStore for FsArtifactStore {
  type Error = io::Error;

  async fn put(&self, name: &str, image: &SignatureImage) -> io::Result<StoredArtifact> {
    // Artifact names are bare file names; anything else would escape `dir`.
    if Path::new(name).file_name().and_then(|n| n.to_str()) != Some(name) {
      return Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("invalid artifact name: {name}"),
      ));
    }

    tokio::fs::create_dir_all(&self.dir).await?;
    let path = self.dir.join(name);
    tokio::fs::write(&path, &image.bytes).await?;
    Ok(StoredArtifact { name: name.to_owned(), location: path.display().to_string() })
  }
}
