use crate::icon::{DecodeError, IconDecoder, Reader, ResourceSource};
use embedded_graphics::{
    geometry::Size, image::ImageRaw, pixelcolor::BinaryColor,
};

/// A decoded 1-bit-per-pixel icon. Rows are padded to a whole byte, most
/// significant bit first, which is the layout [ImageRaw] expects.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BitmapIcon {
    size: Size,
    data: Vec<u8>,
}

impl BitmapIcon {
    pub fn size(&self) -> Size {
        self.size
    }

    /// Get a drawable view of the bitmap
    pub fn as_image_raw(&self) -> ImageRaw<'_, BinaryColor> {
        ImageRaw::new(&self.data, self.size.width)
    }

    /// Parse a bitmap resource: `u16` width, `u16` height, then pixel rows
    pub fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(bytes);
        let width = reader.u16()? as usize;
        let height = reader.u16()? as usize;
        if width == 0 || height == 0 {
            return Err(DecodeError::EmptyBitmap);
        }

        let expected = width.div_ceil(8) * height;
        if reader.remaining() != expected {
            return Err(DecodeError::SizeMismatch {
                expected,
                actual: reader.remaining(),
            });
        }
        let data = reader.take(expected)?.to_vec();
        Ok(Self {
            size: Size::new(width as u32, height as u32),
            data,
        })
    }
}

/// Decoder for monochrome displays
#[derive(Debug)]
pub struct BitmapDecoder<R> {
    resources: R,
}

impl<R: ResourceSource> BitmapDecoder<R> {
    pub fn new(resources: R) -> Self {
        Self { resources }
    }
}

impl<R: ResourceSource> IconDecoder for BitmapDecoder<R> {
    type Image = BitmapIcon;

    fn decode(&self, resource_id: u32) -> Result<BitmapIcon, DecodeError> {
        BitmapIcon::parse(&self.resources.load(resource_id)?)
    }
}
