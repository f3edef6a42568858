//! Icon decoding. Icons are bundled resources addressed by numeric resource
//! ID. There is one decoder per display type, picked once at startup: 1-bit
//! bitmaps for monochrome displays and vector draw commands for color ones.

pub mod bitmap;
pub mod draw_command;

pub use bitmap::{BitmapDecoder, BitmapIcon};
pub use draw_command::{DrawCommandDecoder, DrawCommandImage};

use crate::condition::IconId;
use serde::Deserialize;
use std::{collections::HashMap, fs, io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("No resource with ID {0}")]
    MissingResource(u32),

    #[error("Error reading resource {resource_id}")]
    Io {
        resource_id: u32,
        #[source]
        source: io::Error,
    },

    #[error("Resource truncated: needed {needed} bytes, got {actual}")]
    Truncated { needed: usize, actual: usize },

    #[error("Bad magic bytes {0:02x?}")]
    BadMagic([u8; 4]),

    #[error("Unsupported image version {0}")]
    UnsupportedVersion(u8),

    #[error("Unknown draw command type {0}")]
    UnknownCommand(u8),

    #[error("Size mismatch: header says {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Circle command has {0} points, expected 1")]
    CirclePoints(u16),

    #[error("Bitmap has zero width or height")]
    EmptyBitmap,
}

/// Display capability, which determines how icons are decoded
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayKind {
    #[default]
    Monochrome,
    Color,
}

impl DisplayKind {
    /// File extension of the icon assets for this display
    pub fn extension(self) -> &'static str {
        match self {
            Self::Monochrome => "pbi",
            Self::Color => "pdc",
        }
    }
}

/// Turns a resource ID into a decoded image. Dropping the image releases it.
pub trait IconDecoder {
    type Image;

    fn decode(&self, resource_id: u32) -> Result<Self::Image, DecodeError>;
}

/// Raw resource bytes, by resource ID
pub trait ResourceSource {
    fn load(&self, resource_id: u32) -> Result<Vec<u8>, DecodeError>;
}

impl ResourceSource for HashMap<u32, Vec<u8>> {
    fn load(&self, resource_id: u32) -> Result<Vec<u8>, DecodeError> {
        self.get(&resource_id)
            .cloned()
            .ok_or(DecodeError::MissingResource(resource_id))
    }
}

/// Icon assets in a directory, one file per icon named `<icon>.<extension>`
#[derive(Clone, Debug)]
pub struct ResourceDir {
    root: PathBuf,
    extension: &'static str,
}

impl ResourceDir {
    pub fn new(root: impl Into<PathBuf>, display: DisplayKind) -> Self {
        Self {
            root: root.into(),
            extension: display.extension(),
        }
    }

    fn path(&self, icon: IconId) -> PathBuf {
        self.root.join(format!("{}.{}", icon.name(), self.extension))
    }
}

impl ResourceSource for ResourceDir {
    fn load(&self, resource_id: u32) -> Result<Vec<u8>, DecodeError> {
        let icon = IconId::try_from(resource_id)
            .map_err(DecodeError::MissingResource)?;
        fs::read(self.path(icon)).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                DecodeError::MissingResource(resource_id)
            } else {
                DecodeError::Io {
                    resource_id,
                    source,
                }
            }
        })
    }
}

/// Cursor over a little-endian byte buffer, shared by the decoders
pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::Truncated {
                needed: self.position + len,
                actual: self.bytes.len(),
            });
        }
        let slice = &self.bytes[self.position..self.position + len];
        self.position += len;
        Ok(slice)
    }

    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut array = [0; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    pub fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.array::<1>()?[0])
    }

    pub fn u16(&mut self) -> Result<u16, DecodeError> {
        self.array().map(u16::from_le_bytes)
    }

    pub fn i16(&mut self) -> Result<i16, DecodeError> {
        self.array().map(i16::from_le_bytes)
    }

    pub fn u32(&mut self) -> Result<u32, DecodeError> {
        self.array().map(u32::from_le_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_reader() {
        let mut reader = Reader::new(&[1, 0x34, 0x12, 0xff, 0xff, 9]);
        assert_eq!(reader.u8().unwrap(), 1);
        assert_eq!(reader.u16().unwrap(), 0x1234);
        assert_eq!(reader.i16().unwrap(), -1);
        assert_eq!(reader.remaining(), 1);
        assert!(matches!(
            reader.u32(),
            Err(DecodeError::Truncated {
                needed: 9,
                actual: 6
            })
        ));
    }

    #[test]
    fn test_map_source() {
        let source = HashMap::from([(2, vec![1, 2])]);
        assert_eq!(source.load(2).unwrap(), vec![1, 2]);
        assert!(matches!(
            source.load(3),
            Err(DecodeError::MissingResource(3))
        ));
    }

    #[test]
    fn test_resource_dir() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("weather_cloudy.pbi"), [7, 7]).unwrap();

        let source = ResourceDir::new(root, DisplayKind::Monochrome);
        assert_eq!(
            source.load(IconId::Cloudy.resource_id()).unwrap(),
            vec![7, 7]
        );
        // Known icon, but no file for it
        assert!(matches!(
            source.load(IconId::ClearDay.resource_id()),
            Err(DecodeError::MissingResource(10))
        ));
        // Not an icon at all
        assert!(matches!(
            source.load(0),
            Err(DecodeError::MissingResource(0))
        ));
        // Color assets live under a different extension
        let color = ResourceDir::new(root, DisplayKind::Color);
        assert!(color.load(IconId::Cloudy.resource_id()).is_err());
    }
}
