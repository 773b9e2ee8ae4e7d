use image::{DynamicImage, RgbImage, RgbaImage};

/// A source image: contiguous RGB or RGBA bytes in row-major order.
///
/// Decoding happens at I/O boundaries only; detectors treat pixel data
/// as opaque until preprocessing repacks it into a tensor.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// A frame with no pixels, standing in for "no image available".
    pub fn empty(index: usize) -> Self {
        Self::new(Vec::new(), 0, 0, 3, index)
    }

    pub fn from_rgb_image(image: RgbImage, index: usize) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, 3, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    /// Copy the pixels into an RGB image, dropping alpha for RGBA frames.
    ///
    /// Returns `None` for other channel counts or when the buffer does not
    /// match the frame dimensions.
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        match self.channels {
            3 => RgbImage::from_raw(self.width, self.height, self.data.clone()),
            4 => RgbaImage::from_raw(self.width, self.height, self.data.clone())
                .map(|rgba| DynamicImage::ImageRgba8(rgba).to_rgb8()),
            _ => None,
        }
    }
}
