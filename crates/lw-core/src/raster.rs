use crate::Error;
use crate::geom::Pixel;
use crate::image::{Image, ImageView};

/// Immutable intensity raster handed to the tracing engine.
///
/// Non-finite samples mark no-data pixels; the engine never routes through
/// them.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    image: Image<f32>,
}

impl Raster {
    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> Result<Self, Error> {
        let image = Image::from_vec(width, height, data)?;
        if width == 0 || height == 0 {
            return Err(Error::EmptyRaster);
        }
        Ok(Self { image })
    }

    pub fn from_u8(width: usize, height: usize, data: &[u8]) -> Result<Self, Error> {
        Self::from_vec(width, height, data.iter().map(|&v| v as f32).collect())
    }

    pub fn from_u16(width: usize, height: usize, data: &[u16]) -> Result<Self, Error> {
        Self::from_vec(width, height, data.iter().map(|&v| v as f32).collect())
    }

    pub fn from_view_u8(view: &ImageView<'_, u8>) -> Result<Self, Error> {
        Self::from_view_with(view, |v| v as f32)
    }

    pub fn from_view_u16(view: &ImageView<'_, u16>) -> Result<Self, Error> {
        Self::from_view_with(view, |v| v as f32)
    }

    fn from_view_with<T: Copy>(
        view: &ImageView<'_, T>,
        convert: impl Fn(T) -> f32,
    ) -> Result<Self, Error> {
        let mut out = Vec::with_capacity(view.width() * view.height());
        for y in 0..view.height() {
            out.extend(view.row(y).iter().map(|&v| convert(v)));
        }
        Self::from_vec(view.width(), view.height(), out)
    }

    pub fn width(&self) -> usize {
        self.image.width()
    }

    pub fn height(&self) -> usize {
        self.image.height()
    }

    pub fn image(&self) -> &Image<f32> {
        &self.image
    }

    pub fn value(&self, p: Pixel) -> f32 {
        *self.image.at(p)
    }

    /// `false` for no-data pixels.
    pub fn is_valid(&self, p: Pixel) -> bool {
        self.value(p).is_finite()
    }

    /// Validates a caller-supplied coordinate.
    pub fn pixel(&self, x: isize, y: isize) -> Result<Pixel, Error> {
        if x < 0 || y < 0 || x as usize >= self.width() || y as usize >= self.height() {
            return Err(Error::OutOfBounds { x, y });
        }
        Ok(Pixel::new(x as usize, y as usize))
    }
}
