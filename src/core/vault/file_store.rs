//! File-backed tag store
//!
//! Persists the password tag as a JSON document in the platform data
//! directory. Writes go through a temp file followed by a same-directory
//! rename, so a replaced tag is either fully the old record or fully the new
//! one.

use super::TagStore;
use crate::shared::constants::{TAG_STORE_DIR, TAG_STORE_FILE};
use crate::shared::error::{WalletError, WalletResult};
use crate::shared::types::PasswordTag;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;

pub struct FileTagStore {
    dir: PathBuf,
}

impl FileTagStore {
    pub fn new() -> WalletResult<Self> {
        let base_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("./secure_storage"));
        Self::with_dir(base_dir.join(TAG_STORE_DIR))
    }

    /// Use an explicit directory instead of the platform default.
    pub fn with_dir(dir: PathBuf) -> WalletResult<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn tag_path(&self) -> PathBuf {
        self.dir.join(TAG_STORE_FILE)
    }

    fn tmp_path(&self) -> PathBuf {
        self.dir.join(format!("{}.tmp", TAG_STORE_FILE))
    }
}

impl TagStore for FileTagStore {
    fn load(&self) -> WalletResult<Option<PasswordTag>> {
        let path = self.tag_path();
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        let tag = serde_json::from_slice(&bytes)
            .map_err(|e| WalletError::malformed_data(format!("corrupt password tag: {}", e)))?;
        Ok(Some(tag))
    }

    fn store(&self, tag: &PasswordTag) -> WalletResult<()> {
        let bytes = serde_json::to_vec(tag)?;
        let tmp = self.tmp_path();

        // A stale temp file can survive a crash mid-write.
        let _ = fs::remove_file(&tmp);
        // Owner-only from the first instant the file exists; the tag is
        // ciphertext, but its presence alone says a wallet lives here.
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o600)
            .open(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, self.tag_path())?;
        Ok(())
    }

    fn exists(&self) -> WalletResult<bool> {
        Ok(self.tag_path().exists())
    }

    fn delete(&self) -> WalletResult<()> {
        let _ = fs::remove_file(self.tag_path());
        let _ = fs::remove_file(self.tmp_path());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::{NONCE_LEN, SALT_LEN};
    use crate::shared::types::EncryptedBlob;
    use std::os::unix::fs::PermissionsExt;
    use uuid::Uuid;

    fn sample_tag() -> PasswordTag {
        PasswordTag {
            id: Uuid::new_v4(),
            encrypted_tag: EncryptedBlob::new([1u8; NONCE_LEN], [2u8; SALT_LEN], vec![3, 4, 5]),
        }
    }

    #[test]
    fn test_store_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTagStore::with_dir(dir.path().to_path_buf()).unwrap();

        assert!(!store.exists().unwrap());
        assert_eq!(store.load().unwrap(), None);

        let tag = sample_tag();
        store.store(&tag).unwrap();
        assert!(store.exists().unwrap());
        assert_eq!(store.load().unwrap(), Some(tag));
    }

    #[test]
    fn test_store_overwrites_atomically() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTagStore::with_dir(dir.path().to_path_buf()).unwrap();

        let first = sample_tag();
        let second = sample_tag();
        store.store(&first).unwrap();
        store.store(&second).unwrap();

        assert_eq!(store.load().unwrap(), Some(second));
        // No stray temp file left behind.
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn test_store_recovers_from_stale_temp_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTagStore::with_dir(dir.path().to_path_buf()).unwrap();
        fs::write(store.tmp_path(), b"left over by a crashed write").unwrap();

        let tag = sample_tag();
        store.store(&tag).unwrap();
        assert_eq!(store.load().unwrap(), Some(tag));
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn test_corrupt_tag_is_malformed_data() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTagStore::with_dir(dir.path().to_path_buf()).unwrap();
        fs::write(store.tag_path(), b"not json").unwrap();

        assert!(matches!(
            store.load(),
            Err(WalletError::MalformedData(_))
        ));
    }

    #[test]
    fn test_delete() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTagStore::with_dir(dir.path().to_path_buf()).unwrap();
        store.store(&sample_tag()).unwrap();

        store.delete().unwrap();
        assert!(!store.exists().unwrap());
    }

    #[test]
    fn test_tag_file_permissions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTagStore::with_dir(dir.path().to_path_buf()).unwrap();
        store.store(&sample_tag()).unwrap();

        let mode = fs::metadata(store.tag_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
