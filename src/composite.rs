//! Side-by-side composition of the two stereo views and JPEG encoding of the result.
//!
//! Layout: width is the sum of both widths, height the larger height, each view
//! vertically centred (offset rounded down). The rendering surface takes its
//! pixel format from the left view; formats without a matching surface fall back to RGB8.

use image::codecs::jpeg::JpegEncoder;
use image::{imageops, ColorType, DynamicImage, ImageBuffer, Pixel};

use crate::error::{ConvertError, Result};
use crate::result::{Dimensions, Placement};

/// Default JPEG quality (0.9 on a 0.0-1.0 scale).
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Default upper bound on composite pixel count.
pub const DEFAULT_MAX_COMPOSITE_PIXELS: u64 = 1 << 30;

/// Where each view lands in the composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub size: Dimensions,
    pub left: Placement,
    pub right: Placement,
}

/// Compute the composite layout. None if the width overflows `u32`.
pub fn layout(left: Dimensions, right: Dimensions) -> Option<Layout> {
    let width = left.width.checked_add(right.width)?;
    let height = left.height.max(right.height);
    Some(Layout {
        size: Dimensions::new(width, height),
        left: Placement {
            x: 0,
            y: (height - left.height) / 2,
        },
        right: Placement {
            x: left.width,
            y: (height - right.height) / 2,
        },
    })
}

/// Pixel format of the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceFormat {
    Luma8,
    LumaA8,
    Rgb8,
    Rgba8,
    Luma16,
    LumaA16,
    Rgb16,
    Rgba16,
    Rgb32F,
    Rgba32F,
}

impl SurfaceFormat {
    /// Surface matching `color`, or RGB8 for unknown types.
    pub fn for_color(color: ColorType) -> Self {
        match color {
            ColorType::L8 => SurfaceFormat::Luma8,
            ColorType::La8 => SurfaceFormat::LumaA8,
            ColorType::Rgb8 => SurfaceFormat::Rgb8,
            ColorType::Rgba8 => SurfaceFormat::Rgba8,
            ColorType::L16 => SurfaceFormat::Luma16,
            ColorType::La16 => SurfaceFormat::LumaA16,
            ColorType::Rgb16 => SurfaceFormat::Rgb16,
            ColorType::Rgba16 => SurfaceFormat::Rgba16,
            ColorType::Rgb32F => SurfaceFormat::Rgb32F,
            ColorType::Rgba32F => SurfaceFormat::Rgba32F,
            _ => SurfaceFormat::Rgb8,
        }
    }

    fn bytes_per_pixel(self) -> u64 {
        match self {
            SurfaceFormat::Luma8 => 1,
            SurfaceFormat::LumaA8 | SurfaceFormat::Luma16 => 2,
            SurfaceFormat::Rgb8 => 3,
            SurfaceFormat::Rgba8 | SurfaceFormat::LumaA16 => 4,
            SurfaceFormat::Rgb16 => 6,
            SurfaceFormat::Rgba16 => 8,
            SurfaceFormat::Rgb32F => 12,
            SurfaceFormat::Rgba32F => 16,
        }
    }
}

/// Composite image plus where each view was placed.
#[derive(Debug, Clone)]
pub struct SideBySide {
    pub image: DynamicImage,
    pub left_offset: Placement,
    pub right_offset: Placement,
}

impl SideBySide {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.image.width(), self.image.height())
    }
}

fn dims(img: &DynamicImage) -> Dimensions {
    Dimensions::new(img.width(), img.height())
}

/// Build the side-by-side composite of `left` and `right`.
pub fn compose_side_by_side(
    left: &DynamicImage,
    right: &DynamicImage,
    max_pixels: u64,
) -> Result<SideBySide> {
    let layout = layout(dims(left), dims(right)).ok_or_else(|| {
        ConvertError::CompositeCreationFailed("composite width overflows".to_string())
    })?;
    let Dimensions { width, height } = layout.size;
    if width == 0 || height == 0 {
        return Err(ConvertError::CompositeCreationFailed(format!(
            "empty composite {}",
            layout.size
        )));
    }
    let format = SurfaceFormat::for_color(left.color());
    let pixels = u64::from(width) * u64::from(height);
    let bytes = pixels.checked_mul(format.bytes_per_pixel());
    if pixels > max_pixels || bytes.map_or(true, |b| b > isize::MAX as u64) {
        return Err(ConvertError::CompositeCreationFailed(format!(
            "composite {} exceeds limit of {} pixels",
            layout.size, max_pixels
        )));
    }
    log::debug!(
        "compositing {} + {} into {} as {:?}",
        dims(left),
        dims(right),
        layout.size,
        format
    );

    let image = match format {
        SurfaceFormat::Luma8 => DynamicImage::ImageLuma8(blit(&left.to_luma8(), &right.to_luma8(), &layout)),
        SurfaceFormat::LumaA8 => {
            DynamicImage::ImageLumaA8(blit(&left.to_luma_alpha8(), &right.to_luma_alpha8(), &layout))
        }
        SurfaceFormat::Rgb8 => DynamicImage::ImageRgb8(blit(&left.to_rgb8(), &right.to_rgb8(), &layout)),
        SurfaceFormat::Rgba8 => DynamicImage::ImageRgba8(blit(&left.to_rgba8(), &right.to_rgba8(), &layout)),
        SurfaceFormat::Luma16 => DynamicImage::ImageLuma16(blit(&left.to_luma16(), &right.to_luma16(), &layout)),
        SurfaceFormat::LumaA16 => {
            DynamicImage::ImageLumaA16(blit(&left.to_luma_alpha16(), &right.to_luma_alpha16(), &layout))
        }
        SurfaceFormat::Rgb16 => DynamicImage::ImageRgb16(blit(&left.to_rgb16(), &right.to_rgb16(), &layout)),
        SurfaceFormat::Rgba16 => DynamicImage::ImageRgba16(blit(&left.to_rgba16(), &right.to_rgba16(), &layout)),
        SurfaceFormat::Rgb32F => DynamicImage::ImageRgb32F(blit(&left.to_rgb32f(), &right.to_rgb32f(), &layout)),
        SurfaceFormat::Rgba32F => {
            DynamicImage::ImageRgba32F(blit(&left.to_rgba32f(), &right.to_rgba32f(), &layout))
        }
    };

    Ok(SideBySide {
        image,
        left_offset: layout.left,
        right_offset: layout.right,
    })
}

fn blit<P: Pixel>(
    left: &ImageBuffer<P, Vec<P::Subpixel>>,
    right: &ImageBuffer<P, Vec<P::Subpixel>>,
    layout: &Layout,
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    let mut canvas = ImageBuffer::new(layout.size.width, layout.size.height);
    imageops::replace(&mut canvas, left, i64::from(layout.left.x), i64::from(layout.left.y));
    imageops::replace(&mut canvas, right, i64::from(layout.right.x), i64::from(layout.right.y));
    canvas
}

/// Encode `image` as baseline JPEG. Alpha is dropped and deep formats are
/// reduced to 8 bits, since JPEG carries neither.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let quality = quality.clamp(1, 100);
    let flat = match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => None,
        DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLumaA16(_) => {
            Some(DynamicImage::ImageLuma8(image.to_luma8()))
        }
        _ => Some(DynamicImage::ImageRgb8(image.to_rgb8())),
    };
    let source = flat.as_ref().unwrap_or(image);
    let mut out = Vec::new();
    source
        .write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))
        .map_err(|e| ConvertError::SaveFailed(format!("JPEG encoding failed: {e}")))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_centres_shorter_view() {
        let l = layout(Dimensions::new(100, 50), Dimensions::new(80, 60)).unwrap();
        assert_eq!(l.size, Dimensions::new(180, 60));
        assert_eq!(l.left, Placement { x: 0, y: 5 });
        assert_eq!(l.right, Placement { x: 100, y: 0 });
    }

    #[test]
    fn layout_rounds_offset_down() {
        let l = layout(Dimensions::new(10, 10), Dimensions::new(10, 13)).unwrap();
        assert_eq!(l.left.y, 1);
    }

    #[test]
    fn layout_width_overflow() {
        assert!(layout(Dimensions::new(u32::MAX, 1), Dimensions::new(1, 1)).is_none());
    }

    #[test]
    fn surface_follows_left_color() {
        assert_eq!(SurfaceFormat::for_color(ColorType::Rgb8), SurfaceFormat::Rgb8);
        assert_eq!(SurfaceFormat::for_color(ColorType::L16), SurfaceFormat::Luma16);
    }
}
