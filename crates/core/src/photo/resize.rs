//! Nearest-neighbour downsampling.
//!
//! Every destination pixel copies exactly one source pixel, so output is
//! fully determined by the input and target size. Lower fidelity than
//! bilinear filtering; acceptable for thumbnail-class photos.

use image::{ImageBuffer, RgbImage};

/// Compute the output size for an image under a width ceiling.
///
/// Images at or below `max_width` keep their size. Wider images are scaled
/// to exactly `max_width`, with the height rounded to the nearest pixel and
/// never below 1.
///
/// # Examples
///
/// ```
/// use showcase_core::photo::target_dimensions;
///
/// assert_eq!(target_dimensions(2000, 1000, 1024), (1024, 512));
/// assert_eq!(target_dimensions(800, 600, 1024), (800, 600));
/// ```
pub fn target_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || width == 0 {
        return (width, height);
    }
    let (w, h, m) = (u64::from(width), u64::from(height), u64::from(max_width));
    // round(h * m / w) without floating point
    let new_height = (2 * h * m + w) / (2 * w);
    (max_width, new_height.max(1) as u32)
}

/// Resample `src` to `dst_width` x `dst_height`.
///
/// Destination `(x, y)` reads source
/// `(floor(x * src_w / dst_w), floor(y * src_h / dst_h))`.
pub fn resize_nearest(src: &RgbImage, dst_width: u32, dst_height: u32) -> RgbImage {
    let (src_w, src_h) = (u64::from(src.width()), u64::from(src.height()));
    let (dst_w, dst_h) = (u64::from(dst_width), u64::from(dst_height));

    ImageBuffer::from_fn(dst_width, dst_height, |x, y| {
        let sx = (u64::from(x) * src_w / dst_w) as u32;
        let sy = (u64::from(y) * src_h / dst_h) as u32;
        *src.get_pixel(sx, sy)
    })
}
