use crate::icon::{DecodeError, IconDecoder, Reader, ResourceSource};
use embedded_graphics::{
    geometry::{Point, Size},
    pixelcolor::Rgb888,
};

const MAGIC: [u8; 4] = *b"PDCI";
const VERSION: u8 = 1;

/// A decoded vector icon: a view box plus an ordered list of draw commands
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DrawCommandImage {
    pub view_box: Size,
    pub commands: Vec<DrawCommand>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DrawCommand {
    pub shape: Shape,
    pub hidden: bool,
    /// `None` is fully transparent
    pub stroke_color: Option<Rgb888>,
    pub stroke_width: u8,
    pub fill_color: Option<Rgb888>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Shape {
    Path { open: bool, points: Vec<Point> },
    Circle { center: Point, radius: u16 },
}

impl DrawCommandImage {
    /// Parse a draw command resource. Layout (little-endian):
    ///
    /// ```text
    /// "PDCI" | u32 size | u8 version | u8 reserved | i16 w | i16 h
    /// u16 command count | commands...
    /// ```
    ///
    /// where `size` counts every byte after the size field itself.
    pub fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(bytes);
        let magic: [u8; 4] = reader.array()?;
        if magic != MAGIC {
            return Err(DecodeError::BadMagic(magic));
        }
        let expected = reader.u32()? as usize;
        if reader.remaining() != expected {
            return Err(DecodeError::SizeMismatch {
                expected,
                actual: reader.remaining(),
            });
        }

        let version = reader.u8()?;
        if version != VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }
        let _reserved = reader.u8()?;
        let width = reader.i16()?.max(0) as u32;
        let height = reader.i16()?.max(0) as u32;

        let count = reader.u16()?;
        let commands = (0..count)
            .map(|_| DrawCommand::parse(&mut reader))
            .collect::<Result<_, _>>()?;

        Ok(Self {
            view_box: Size::new(width, height),
            commands,
        })
    }

    /// Commands that should actually be drawn
    pub fn visible_commands(&self) -> impl '_ + Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(|command| !command.hidden)
    }
}

impl DrawCommand {
    fn parse(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let kind = reader.u8()?;
        let hidden = reader.u8()? != 0;
        let stroke_color = argb2222(reader.u8()?);
        let stroke_width = reader.u8()?;
        let fill_color = argb2222(reader.u8()?);
        let open_or_radius = reader.u16()?;
        let point_count = reader.u16()?;
        let points = (0..point_count)
            .map(|_| -> Result<Point, DecodeError> {
                let x = reader.i16()?;
                let y = reader.i16()?;
                Ok(Point::new(x.into(), y.into()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let shape = match kind {
            1 => Shape::Path {
                open: open_or_radius != 0,
                points,
            },
            2 => match points.as_slice() {
                [center] => Shape::Circle {
                    center: *center,
                    radius: open_or_radius,
                },
                _ => return Err(DecodeError::CirclePoints(point_count)),
            },
            _ => return Err(DecodeError::UnknownCommand(kind)),
        };

        Ok(Self {
            shape,
            hidden,
            stroke_color,
            stroke_width,
            fill_color,
        })
    }
}

/// Expand an 8-bit ARGB color (2 bits per channel). Zero alpha means
/// transparent.
fn argb2222(color: u8) -> Option<Rgb888> {
    let channel = |shift: u8| ((color >> shift) & 0b11) * 85;
    if channel(6) == 0 {
        None
    } else {
        Some(Rgb888::new(channel(4), channel(2), channel(0)))
    }
}

/// Decoder for color displays
#[derive(Debug)]
pub struct DrawCommandDecoder<R> {
    resources: R,
}

impl<R: ResourceSource> DrawCommandDecoder<R> {
    pub fn new(resources: R) -> Self {
        Self { resources }
    }
}

impl<R: ResourceSource> IconDecoder for DrawCommandDecoder<R> {
    type Image = DrawCommandImage;

    fn decode(
        &self,
        resource_id: u32,
    ) -> Result<DrawCommandImage, DecodeError> {
        DrawCommandImage::parse(&self.resources.load(resource_id)?)
    }
}
