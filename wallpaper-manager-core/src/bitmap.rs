use image::RgbaImage;

use crate::error::Result;

/// Decoded image, RGBA8 with straight alpha.
#[derive(Debug, Clone)]
pub struct Bitmap {
    image: RgbaImage,
}

impl Bitmap {
    /// Decodes PNG, JPEG, WebP, GIF or BMP bytes, sniffing the format.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Self { image })
    }

    pub fn from_rgba(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    /// Pixels with colour channels multiplied by alpha, the layout Android's
    /// `Bitmap.copyPixelsFromBuffer` expects for `ARGB_8888`.
    pub fn premultiplied_pixels(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.image.as_raw().len());
        for px in self.image.pixels() {
            let [r, g, b, a] = px.0;
            let scale = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
            out.extend_from_slice(&[scale(r), scale(g), scale(b), a]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::png_bytes;

    #[test]
    fn decodes_png_dimensions() {
        let bitmap = Bitmap::decode(&png_bytes(7, 3, [1, 2, 3, 255])).unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (7, 3));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = Bitmap::decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, crate::WallpaperError::Decode(_)));
    }

    #[test]
    fn premultiplies_alpha() {
        let bitmap = Bitmap::decode(&png_bytes(1, 1, [200, 100, 50, 128])).unwrap();
        assert_eq!(bitmap.premultiplied_pixels(), vec![100, 50, 25, 128]);

        let opaque = Bitmap::decode(&png_bytes(1, 1, [200, 100, 50, 255])).unwrap();
        assert_eq!(opaque.premultiplied_pixels(), vec![200, 100, 50, 255]);
    }
}
