//! Encrypted blob persistence, one file per identity.
//!
//! Each identity gets its own directory under the data dir, named by the
//! SHA-256 of the identity so arbitrary identity strings map to safe,
//! deterministic paths:
//!
//! ```text
//! <data_dir>/<hex(sha256(identity))>/store.vault
//! ```
//!
//! Writes go through a temp file and a rename, so readers only ever see
//! the previous blob or the new one.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::errors::Result;

/// File name of the encrypted blob inside an identity directory.
const BLOB_FILE: &str = "store.vault";

/// Directory holding everything stored for `identity` under `root`.
pub fn identity_dir(root: &Path, identity: &str) -> PathBuf {
    let digest = Sha256::digest(identity.as_bytes());
    let name: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    root.join(name)
}

/// Reads and writes the encrypted blobs under a data directory.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of the blob for `identity`.
    pub fn path_for(&self, identity: &str) -> PathBuf {
        identity_dir(&self.root, identity).join(BLOB_FILE)
    }

    pub fn exists(&self, identity: &str) -> bool {
        self.path_for(identity).is_file()
    }

    /// Read the blob, or `None` if no vault was ever created.
    pub fn read(&self, identity: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(identity)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the blob **atomically**.
    ///
    /// 1. Create the identity directory on demand.
    /// 2. Write and sync a temp file in the same directory.
    /// 3. Rename the temp file over the target path.
    pub fn write(&self, identity: &str, blob: &[u8]) -> Result<()> {
        write_atomic(&self.path_for(identity), blob)?;
        debug!(bytes = blob.len(), "vault blob written");
        Ok(())
    }

    /// Remove the blob irrecoverably. Returns whether a file existed.
    pub fn delete(&self, identity: &str) -> Result<bool> {
        match fs::remove_file(self.path_for(identity)) {
            Ok(()) => {
                info!("vault blob deleted");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Replace `path` with `bytes` so that a crash leaves either the previous
/// file or the new one, never a truncated mix.
///
/// The temp file is owner-only and synced before the rename; on Unix the
/// directory is synced afterwards so the rename itself is durable.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(parent)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = parent.join(format!(".{file_name}.tmp"));

    let written = write_synced(&tmp_path, bytes).and_then(|()| fs::rename(&tmp_path, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    #[cfg(unix)]
    fs::File::open(parent)?.sync_all()?;

    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    // A stale temp file keeps its old mode, so set it explicitly.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(bytes)?;
    file.sync_all()
}
