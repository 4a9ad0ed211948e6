//! Structs and functions for handling textures.
//!
//! The module provides [`ImageData`], a decoded image living in host memory, and [`Texture`],
//! which owns an OpenGL texture object and moves the decoded image onto the GPU.

use std::{path::Path, sync::Arc};

use glow::HasContext;
use image::{DynamicImage, ImageReader};

use crate::error::{Error, ErrorKind, Result};

/// Layout of the pixels of a decoded image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// One channel, gray.
    Luminance,
    /// Two channels, gray and alpha.
    LuminanceAlpha,
    Rgb,
    Rgba,
}

impl PixelFormat {
    /// Maps a channel count to its pixel format.
    pub fn from_channels(channels: u8) -> Result<Self> {
        match channels {
            1 => Ok(PixelFormat::Luminance),
            2 => Ok(PixelFormat::LuminanceAlpha),
            3 => Ok(PixelFormat::Rgb),
            4 => Ok(PixelFormat::Rgba),
            n => Err(Error::new(
                ErrorKind::UnsupportedFormat,
                format!("images with {n} channels are not supported"),
            )),
        }
    }

    /// Number of 8 bit channels per pixel.
    pub fn channels(self) -> u8 {
        match self {
            PixelFormat::Luminance => 1,
            PixelFormat::LuminanceAlpha => 2,
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }

    fn upload_format(self) -> u32 {
        match self {
            PixelFormat::Luminance => glow::RED,
            PixelFormat::LuminanceAlpha => glow::RG,
            PixelFormat::Rgb => glow::RGB,
            PixelFormat::Rgba => glow::RGBA,
        }
    }

    fn internal_format(self) -> u32 {
        match self {
            PixelFormat::Luminance => glow::R8,
            PixelFormat::LuminanceAlpha => glow::RG8,
            PixelFormat::Rgb => glow::RGB8,
            PixelFormat::Rgba => glow::RGBA8,
        }
    }

    // Core profiles dropped luminance textures, so gray images are stored in red (and green for
    // alpha) and swizzled back to what a luminance texture would sample as. Color formats get the
    // identity so a reused texture object never keeps a gray swizzle.
    fn swizzle(self) -> [u32; 4] {
        match self {
            PixelFormat::Luminance => [glow::RED, glow::RED, glow::RED, glow::ONE],
            PixelFormat::LuminanceAlpha => [glow::RED, glow::RED, glow::RED, glow::GREEN],
            PixelFormat::Rgb | PixelFormat::Rgba => {
                [glow::RED, glow::GREEN, glow::BLUE, glow::ALPHA]
            }
        }
    }
}

/// A decoded image in host memory, 8 bits per channel, rows top to bottom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
}

impl ImageData {
    /// Reads and decodes the image file at `path`.
    pub fn decode(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| {
                Error::new(
                    ErrorKind::FileLoad,
                    format!("image file {} could not be opened: {e}", path.display()),
                )
            })?;
        let image = reader.decode().map_err(|e| {
            Error::new(
                ErrorKind::ImageDecode,
                format!("image file {} could not be decoded: {e}", path.display()),
            )
        })?;
        Self::from_image(image)
    }

    /// Converts an already decoded image, keeping its channel layout.
    pub fn from_image(image: DynamicImage) -> Result<Self> {
        let format = PixelFormat::from_channels(image.color().channel_count())?;
        let (width, height) = (image.width(), image.height());
        let pixels = match format {
            PixelFormat::Luminance => image.into_luma8().into_raw(),
            PixelFormat::LuminanceAlpha => image.into_luma_alpha8().into_raw(),
            PixelFormat::Rgb => image.into_rgb8().into_raw(),
            PixelFormat::Rgba => image.into_rgba8().into_raw(),
        };

        Ok(Self {
            width,
            height,
            format,
            pixels,
        })
    }
}

/// Represents a texture, from the image in host memory to the object on the GPU side.
///
/// The GPU object is created by the first upload, so a texture that never reached the GPU owns
/// no GPU handle at all.
pub struct Texture {
    gl: Arc<glow::Context>,
    id: Option<glow::Texture>,
    image: Option<ImageData>,
    width: u32,
    height: u32,
    format: Option<PixelFormat>,
}

impl Texture {
    /// Creates a texture with no image.
    pub fn empty(gl: &Arc<glow::Context>) -> Self {
        Self {
            gl: Arc::clone(gl),
            id: None,
            image: None,
            width: 0,
            height: 0,
            format: None,
        }
    }

    /// Creates a texture and decodes `path` into memory right away.
    pub fn from_file(gl: &Arc<glow::Context>, path: impl AsRef<Path>) -> Result<Self> {
        let mut texture = Self::empty(gl);
        texture.load_to_memory(path)?;
        Ok(texture)
    }

    /// Decodes the image at `path` into host memory, replacing the previous image.
    pub fn load_to_memory(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let image = ImageData::decode(path.as_ref())?;
        log::debug!(
            "decoded {} ({}x{}, {:?})",
            path.as_ref().display(),
            image.width,
            image.height,
            image.format
        );
        self.set_image(image);
        Ok(())
    }

    /// Stores an already decoded image for the next upload.
    pub fn set_image(&mut self, image: ImageData) {
        self.width = image.width;
        self.height = image.height;
        self.format = Some(image.format);
        self.image = Some(image);
    }

    /// Uploads the image held in memory to the GPU.
    ///
    /// The host copy is kept, so the texture can be uploaded again later. Fails with
    /// [`ErrorKind::ImageNotLoaded`] if there is nothing to upload.
    pub fn load_to_gpu(&mut self) -> Result<()> {
        let Some(image) = &self.image else {
            return Err(Error::new(
                ErrorKind::ImageNotLoaded,
                "the image has not been loaded to memory yet, use load_to_memory() first or \
                 load_to_memory_and_gpu() instead",
            ));
        };

        let id = match self.id {
            Some(id) => id,
            None => {
                let id = create_texture(&self.gl)?;
                self.id = Some(id);
                id
            }
        };

        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(id));
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                image.format.internal_format() as i32,
                image.width as i32,
                image.height as i32,
                0,
                image.format.upload_format(),
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(image.pixels.as_slice())),
            );
            let [r, g, b, a] = image.format.swizzle();
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_SWIZZLE_R, r as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_SWIZZLE_G, g as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_SWIZZLE_B, b as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_SWIZZLE_A, a as i32);
        }
        log::debug!("uploaded {}x{} texture {id:?}", image.width, image.height);

        Ok(())
    }

    /// Decodes `path` and uploads it, in that order.
    pub fn load_to_memory_and_gpu(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.load_to_memory(path)?;
        self.load_to_gpu()
    }

    /// Activates texture unit `unit` and binds the texture to it. Does nothing before upload.
    pub fn active_and_bind(&self, unit: u32) {
        if let Some(id) = self.id {
            unsafe {
                self.gl.active_texture(glow::TEXTURE0 + unit);
                self.gl.bind_texture(glow::TEXTURE_2D, Some(id));
            }
        }
    }

    /// Binds the texture to the active unit. Does nothing before upload.
    pub fn bind(&self) {
        if let Some(id) = self.id {
            unsafe {
                self.gl.bind_texture(glow::TEXTURE_2D, Some(id));
            }
        }
    }

    /// Unbinds the active unit's 2D texture. Does nothing before upload.
    pub fn unbind(&self) {
        if self.id.is_some() {
            unsafe {
                self.gl.bind_texture(glow::TEXTURE_2D, None);
            }
        }
    }

    /// Returns the width of the texture.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the texture.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> Option<PixelFormat> {
        self.format
    }

    /// Whether an image is held in host memory, ready for [`Texture::load_to_gpu`].
    pub fn is_loaded_to_memory(&self) -> bool {
        self.image.is_some()
    }

    pub fn is_loaded_to_gpu(&self) -> bool {
        self.id.is_some()
    }

    /// The GPU handle, once uploaded.
    pub fn handle(&self) -> Option<glow::Texture> {
        self.id
    }
}

fn create_texture(gl: &glow::Context) -> Result<glow::Texture> {
    unsafe {
        let texture = gl.create_texture().map_err(|e| {
            Error::new(ErrorKind::CreateTexture, format!("texture creation failed: {e}"))
        })?;
        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
        Ok(texture)
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            unsafe {
                self.gl.delete_texture(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use image::{GrayAlphaImage, GrayImage, ImageBuffer, Luma, RgbImage, RgbaImage};

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("basegl-{}-{name}", std::process::id()))
    }

    fn decode_saved(name: &str, image: DynamicImage) -> ImageData {
        let path = temp_path(name);
        image.save(&path).unwrap();
        let data = ImageData::decode(&path);
        std::fs::remove_file(&path).unwrap();
        data.unwrap()
    }

    #[test]
    fn test_supported_channel_counts() {
        assert_eq!(PixelFormat::from_channels(1).unwrap(), PixelFormat::Luminance);
        assert_eq!(PixelFormat::from_channels(2).unwrap(), PixelFormat::LuminanceAlpha);
        assert_eq!(PixelFormat::from_channels(3).unwrap(), PixelFormat::Rgb);
        assert_eq!(PixelFormat::from_channels(4).unwrap(), PixelFormat::Rgba);
        for n in 1..=4 {
            assert_eq!(PixelFormat::from_channels(n).unwrap().channels(), n);
        }
    }

    #[test]
    fn test_unsupported_channel_counts() {
        for n in [0, 5, 8, 255] {
            let err = PixelFormat::from_channels(n).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
        }
    }

    #[test]
    fn test_swizzles() {
        assert_eq!(
            PixelFormat::Luminance.swizzle(),
            [glow::RED, glow::RED, glow::RED, glow::ONE]
        );
        assert_eq!(
            PixelFormat::LuminanceAlpha.swizzle(),
            [glow::RED, glow::RED, glow::RED, glow::GREEN]
        );
        let identity = [glow::RED, glow::GREEN, glow::BLUE, glow::ALPHA];
        assert_eq!(PixelFormat::Rgb.swizzle(), identity);
        assert_eq!(PixelFormat::Rgba.swizzle(), identity);
        assert_eq!(PixelFormat::LuminanceAlpha.upload_format(), glow::RG);
        assert_eq!(PixelFormat::Rgb.internal_format(), glow::RGB8);
    }

    #[test]
    fn test_decode_keeps_channel_layout() {
        let gray = decode_saved("gray.png", DynamicImage::ImageLuma8(GrayImage::new(3, 2)));
        assert_eq!(gray.format, PixelFormat::Luminance);
        assert_eq!((gray.width, gray.height), (3, 2));
        assert_eq!(gray.pixels.len(), 6);

        let gray_alpha = decode_saved(
            "gray-alpha.png",
            DynamicImage::ImageLumaA8(GrayAlphaImage::new(3, 2)),
        );
        assert_eq!(gray_alpha.format, PixelFormat::LuminanceAlpha);
        assert_eq!(gray_alpha.pixels.len(), 12);

        let rgb = decode_saved("rgb.png", DynamicImage::ImageRgb8(RgbImage::new(3, 2)));
        assert_eq!(rgb.format, PixelFormat::Rgb);
        assert_eq!(rgb.pixels.len(), 18);

        let rgba = decode_saved("rgba.png", DynamicImage::ImageRgba8(RgbaImage::new(3, 2)));
        assert_eq!(rgba.format, PixelFormat::Rgba);
        assert_eq!(rgba.pixels.len(), 24);
    }

    #[test]
    fn test_sixteen_bit_images_are_narrowed() {
        let image: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_pixel(2, 2, Luma([u16::MAX]));
        let data = ImageData::from_image(DynamicImage::ImageLuma16(image)).unwrap();
        assert_eq!(data.format, PixelFormat::Luminance);
        assert_eq!(data.pixels, vec![255; 4]);
    }

    #[test]
    fn test_pixel_values_survive_decoding() {
        let mut image = RgbImage::new(2, 1);
        image.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        image.put_pixel(1, 0, image::Rgb([0, 0, 255]));
        let data = decode_saved("pixels.png", DynamicImage::ImageRgb8(image));
        assert_eq!(data.pixels, vec![255, 0, 0, 0, 0, 255]);
    }

    #[test]
    fn test_missing_file() {
        let err = ImageData::decode(temp_path("does-not-exist.png")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileLoad);
    }

    #[test]
    fn test_garbage_file() {
        let path = temp_path("garbage.png");
        std::fs::write(&path, b"definitely not an image").unwrap();
        let err = ImageData::decode(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(err.kind(), ErrorKind::ImageDecode);
    }
}
