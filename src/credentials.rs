//! Remembered WiFi networks in an emulated EEPROM image
//!
//! Layout of the image (byte offsets):
//!
//! ```text
//!   0 ┬ SSID, slot 0        100 ┬ password, slot 0       300 ─ toggle marker
//!  50 ┴ SSID, slot 50       150 ┴ password, slot 50
//! ```
//!
//! Fields are null-terminated strings. Writes alternate between the two slots
//! using the marker, so the two most recently saved networks are kept.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const SSID_BASE: usize = 0;
const PASSWORD_BASE: usize = 100;
const SLOTS: [usize; 2] = [0, 50];
const MARKER_OFFSET: usize = 300;

/// Longest string returned by a read
const MAX_READ_LEN: usize = 100;

/// Longest storable field; one byte of the 50-byte slot is the terminator
pub const MAX_FIELD_LEN: usize = 49;

/// Smallest image that fits the layout
pub const MIN_IMAGE_SIZE: usize = MARKER_OFFSET + 2;

/// A saved network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub ssid: String,
    pub password: String,
}

/// Persistent storage for remembered networks
pub trait CredentialStore: Send {
    /// Remembered networks in slot order, empty slots skipped
    fn read_credentials(&self) -> Vec<Credentials>;

    /// Save a network into the next slot and persist it
    fn write_credentials(&mut self, ssid: &str, password: &str) -> Result<()>;
}

/// Fixed-size byte image backed by a file
#[derive(Debug)]
pub struct EepromImage {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl EepromImage {
    /// Open the image at `path`, creating a zeroed one if the file is missing.
    ///
    /// Existing files are truncated or zero-padded to `size`.
    pub fn open<P: AsRef<Path>>(path: P, size: usize) -> Result<Self> {
        if size < MIN_IMAGE_SIZE {
            return Err(Error::Storage(format!(
                "image size {} is below the minimum of {} bytes",
                size, MIN_IMAGE_SIZE
            )));
        }

        let path = path.as_ref().to_path_buf();
        let mut bytes = if path.exists() {
            fs::read(&path)?
        } else {
            log::info!("Creating credential image at {}", path.display());
            Vec::new()
        };
        bytes.resize(size, 0);

        Ok(Self { path, bytes })
    }

    /// Image size in bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Read a null-terminated string at `offset`
    pub fn read_string(&self, offset: usize) -> String {
        let Some(tail) = self.bytes.get(offset..) else {
            return String::new();
        };
        let field: Vec<u8> = tail
            .iter()
            .take(MAX_READ_LEN)
            .take_while(|&&b| b != 0)
            .copied()
            .collect();
        String::from_utf8_lossy(&field).into_owned()
    }

    /// Write `value` plus terminator at `offset` (in memory only)
    pub fn write_string(&mut self, offset: usize, value: &str) -> Result<()> {
        let end = offset + value.len();
        if end >= self.bytes.len() {
            return Err(Error::Storage(format!(
                "string of {} bytes at offset {} does not fit the image",
                value.len(),
                offset
            )));
        }
        self.bytes[offset..end].copy_from_slice(value.as_bytes());
        self.bytes[end] = 0;
        Ok(())
    }

    /// Flush the image to its file
    pub fn commit(&self) -> Result<()> {
        fs::write(&self.path, &self.bytes)?;
        Ok(())
    }
}

/// [`CredentialStore`] using the two-slot EEPROM layout
#[derive(Debug)]
pub struct EepromCredentialStore {
    image: EepromImage,
}

impl EepromCredentialStore {
    pub fn new(image: EepromImage) -> Self {
        Self { image }
    }

    pub fn open<P: AsRef<Path>>(path: P, size: usize) -> Result<Self> {
        Ok(Self::new(EepromImage::open(path, size)?))
    }

    pub fn image(&self) -> &EepromImage {
        &self.image
    }

    /// Pick the slot for the next write and flip the marker
    fn next_slot(&mut self) -> Result<usize> {
        if self.image.read_string(MARKER_OFFSET) == "a" {
            self.image.write_string(MARKER_OFFSET, "b")?;
            Ok(SLOTS[0])
        } else {
            self.image.write_string(MARKER_OFFSET, "a")?;
            Ok(SLOTS[1])
        }
    }
}

impl CredentialStore for EepromCredentialStore {
    fn read_credentials(&self) -> Vec<Credentials> {
        SLOTS
            .iter()
            .map(|slot| Credentials {
                ssid: self.image.read_string(SSID_BASE + slot),
                password: self.image.read_string(PASSWORD_BASE + slot),
            })
            .filter(|c| !c.ssid.is_empty())
            .collect()
    }

    fn write_credentials(&mut self, ssid: &str, password: &str) -> Result<()> {
        if ssid.is_empty() {
            return Err(Error::InvalidParameter("SSID must not be empty".to_string()));
        }
        for (name, value) in [("SSID", ssid), ("password", password)] {
            if value.len() > MAX_FIELD_LEN || value.as_bytes().contains(&0) {
                return Err(Error::InvalidParameter(format!(
                    "{} must be at most {} bytes without NUL",
                    name, MAX_FIELD_LEN
                )));
            }
        }

        let slot = self.next_slot()?;
        self.image.write_string(SSID_BASE + slot, ssid)?;
        self.image.write_string(PASSWORD_BASE + slot, password)?;
        self.image.commit()?;

        log::info!("Saved credentials for '{}' in slot {}", ssid, slot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_image_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = EepromCredentialStore::open(dir.path().join("creds.bin"), 512).unwrap();
        assert!(store.read_credentials().is_empty());
        assert_eq!(store.image().size(), 512);
    }

    #[test]
    fn test_rejects_small_image() {
        let dir = tempfile::tempdir().unwrap();
        let result = EepromImage::open(dir.path().join("creds.bin"), 128);
        assert!(matches!(result, Err(Error::Storage(_))));
    }

    #[test]
    fn test_read_string_stops_at_terminator() {
        let dir = tempfile::tempdir().unwrap();
        let mut image = EepromImage::open(dir.path().join("img.bin"), 512).unwrap();
        image.write_string(10, "hello").unwrap();
        image.write_string(13, "p").unwrap();
        assert_eq!(image.read_string(10), "help");
        assert_eq!(image.read_string(600), "");
    }

    #[test]
    fn test_read_string_capped() {
        let dir = tempfile::tempdir().unwrap();
        let mut image = EepromImage::open(dir.path().join("img.bin"), 512).unwrap();
        let long = "x".repeat(150);
        image.write_string(0, &long).unwrap();
        assert_eq!(image.read_string(0).len(), MAX_READ_LEN);
    }

    #[test]
    fn test_first_write_uses_slot_50() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = EepromCredentialStore::open(dir.path().join("creds.bin"), 512).unwrap();
        store.write_credentials("home", "secret").unwrap();

        assert_eq!(store.image().read_string(300), "a");
        assert_eq!(store.image().read_string(50), "home");
        assert_eq!(store.image().read_string(150), "secret");
        assert_eq!(store.image().read_string(0), "");
    }

    #[test]
    fn test_rejects_oversized_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = EepromCredentialStore::open(dir.path().join("creds.bin"), 512).unwrap();
        let long = "n".repeat(MAX_FIELD_LEN + 1);
        assert!(store.write_credentials(&long, "pw").is_err());
        assert!(store.write_credentials("", "pw").is_err());
        assert!(store.read_credentials().is_empty());
    }
}
