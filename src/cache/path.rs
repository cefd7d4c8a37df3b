//! Cache filename derivation

use md5::{Digest, Md5};
use std::path::{Path, PathBuf};

/// Cache filename for a remote path: hex MD5 of its UTF-8 bytes
pub fn local_name(remote_path: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(remote_path.as_bytes());
    hex::encode(hasher.finalize())
}

/// Full cache path for a remote path inside `cache_dir`
pub fn local_path(cache_dir: &Path, remote_path: &str) -> PathBuf {
    cache_dir.join(local_name(remote_path))
}
