//! Rasterizing a module matrix into a square bitmap.
//!
//! The layout is expressed in fractions of the final canvas so that a preview and a large export
//! look identical apart from resolution: a 10% light border on each side, the symbol stretched
//! over the remaining 80%, and an optional circular icon covering 20% of the width, sitting on a
//! light halo 1.2 times its size.

use image::imageops::{self, FilterType};
use image::{Pixel, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;

use crate::encoder::SymbolMatrix;
use crate::error::{Error, Result};
use crate::icon::Icon;

pub const DARK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const LIGHT: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Border on each side, as a fraction of the canvas side.
pub const QUIET_ZONE_RATIO: f64 = 0.1;
/// Icon diameter as a fraction of the canvas side.
pub const ICON_RATIO: f64 = 0.2;
/// Halo diameter relative to the icon diameter.
pub const HALO_FACTOR: f64 = 1.2;

/// Largest RGBA canvas, in bytes, that [`compose`] will allocate (1 GiB, a 16384 px square).
pub const MAX_CANVAS_BYTES: u64 = 1 << 30;

/// Checks that a `size` × `size` RGBA canvas is non-empty and fits in [`MAX_CANVAS_BYTES`].
pub fn check_canvas_size(size: u32) -> Result<()> {
    let bytes = u64::from(size)
        .checked_mul(u64::from(size))
        .and_then(|pixels| pixels.checked_mul(4));
    match bytes {
        Some(bytes) if size > 0 && bytes <= MAX_CANVAS_BYTES => Ok(()),
        _ => Err(Error::InvalidSize(size)),
    }
}

/// Pixel geometry of a canvas of a given size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub size: u32,
    /// Width of the light border, rounded up so the symbol never enters the outer 10%.
    pub quiet_zone: u32,
    /// Side of the square the symbol is stretched over.
    pub inner: u32,
    pub icon_diameter: u32,
    pub halo_radius: u32,
}

impl Layout {
    pub fn for_size(size: u32) -> Self {
        let quiet_zone = size.div_ceil(10);
        let inner = size.saturating_sub(2 * quiet_zone);
        let icon_diameter = (f64::from(size) * ICON_RATIO).round() as u32;
        let halo_radius = (f64::from(icon_diameter) * HALO_FACTOR / 2.0).round() as u32;
        Layout {
            size,
            quiet_zone,
            inner,
            icon_diameter,
            halo_radius,
        }
    }

    /// Pixel offset of module boundary `k` of `modules` along either axis.
    ///
    /// Boundaries are shared between neighbours so there are no gaps or overlaps, and boundary
    /// `modules` lands exactly on the far edge of the inner square.
    pub fn module_edge(&self, k: usize, modules: usize) -> u32 {
        let offset = u64::from(self.inner) * k as u64 / modules as u64;
        self.quiet_zone + offset as u32
    }
}

/// Renders `matrix` onto a `target_size` square canvas, with an optional icon in the middle.
///
/// The result depends only on the arguments. The symbol's own side length is used, whatever tier
/// was asked of the encoder.
///
/// # Errors
///
/// [`Error::EncodingUnavailable`] for an empty or non-square matrix, [`Error::InvalidSize`] for
/// a zero `target_size` or one whose canvas would exceed [`MAX_CANVAS_BYTES`].
pub fn compose(matrix: &SymbolMatrix, target_size: u32, icon: Option<&Icon>) -> Result<RgbaImage> {
    matrix.validate()?;
    check_canvas_size(target_size)?;

    let layout = Layout::for_size(target_size);
    let mut canvas = RgbaImage::from_pixel(target_size, target_size, LIGHT);
    draw_modules(&mut canvas, matrix, &layout);

    if let Some(icon) = icon {
        overlay_icon(&mut canvas, icon, &layout);
    }

    Ok(canvas)
}

fn draw_modules(canvas: &mut RgbaImage, matrix: &SymbolMatrix, layout: &Layout) {
    let modules = matrix.side();
    for (row, cells) in matrix.rows().iter().enumerate() {
        let top = layout.module_edge(row, modules);
        let height = layout.module_edge(row + 1, modules) - top;
        if height == 0 {
            continue;
        }
        for (column, &dark) in cells.iter().enumerate() {
            if !dark {
                continue;
            }
            let left = layout.module_edge(column, modules);
            let width = layout.module_edge(column + 1, modules) - left;
            if width == 0 {
                continue;
            }
            let rect = Rect::at(left as i32, top as i32).of_size(width, height);
            draw_filled_rect_mut(canvas, rect, DARK);
        }
    }
}

fn overlay_icon(canvas: &mut RgbaImage, icon: &Icon, layout: &Layout) {
    let diameter = layout.icon_diameter;
    if diameter == 0 || icon.width() == 0 || icon.height() == 0 {
        return;
    }

    let center = (layout.size / 2) as i32;
    draw_filled_circle_mut(canvas, (center, center), layout.halo_radius as i32, LIGHT);

    let scaled = imageops::resize(icon.image(), diameter, diameter, FilterType::Lanczos3);
    let origin = (layout.size - diameter) / 2;
    let radius = f64::from(diameter) / 2.0;

    for (x, y, pixel) in scaled.enumerate_pixels() {
        let dx = f64::from(x) + 0.5 - radius;
        let dy = f64::from(y) + 0.5 - radius;
        if dx * dx + dy * dy > radius * radius {
            continue;
        }
        canvas.get_pixel_mut(origin + x, origin + y).blend(pixel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(side: usize) -> SymbolMatrix {
        SymbolMatrix::from_rows(
            (0..side)
                .map(|r| (0..side).map(|c| (r + c) % 2 == 0).collect())
                .collect(),
        )
    }

    fn solid(side: usize) -> SymbolMatrix {
        SymbolMatrix::from_rows(vec![vec![true; side]; side])
    }

    fn red_icon() -> Icon {
        Icon::from_image(RgbaImage::from_pixel(16, 8, Rgba([255, 0, 0, 255])).into())
    }

    #[test]
    fn layout_at_preview_size() {
        let layout = Layout::for_size(400);
        assert_eq!(layout.quiet_zone, 40);
        assert_eq!(layout.inner, 320);
        assert_eq!(layout.icon_diameter, 80);
        assert_eq!(layout.halo_radius, 48);
        assert_eq!(layout.module_edge(0, 21), 40);
        assert_eq!(layout.module_edge(21, 21), 360);
    }

    #[test]
    fn canvas_has_requested_size_and_light_border() {
        let image = compose(&solid(21), 400, None).unwrap();
        assert_eq!(image.dimensions(), (400, 400));
        assert_eq!(*image.get_pixel(39, 200), LIGHT);
        assert_eq!(*image.get_pixel(40, 200), DARK);
        assert_eq!(*image.get_pixel(359, 359), DARK);
        assert_eq!(*image.get_pixel(360, 200), LIGHT);
        assert_eq!(*image.get_pixel(200, 360), LIGHT);
    }

    #[test]
    fn light_modules_stay_background() {
        let image = compose(&checkerboard(2), 100, None).unwrap();
        // inner square 80 px, modules of 40 px starting at 10
        assert_eq!(*image.get_pixel(20, 20), DARK);
        assert_eq!(*image.get_pixel(60, 20), LIGHT);
        assert_eq!(*image.get_pixel(20, 60), LIGHT);
        assert_eq!(*image.get_pixel(60, 60), DARK);
    }

    #[test]
    fn icon_sits_on_halo_in_the_center() {
        let image = compose(&solid(21), 400, Some(&red_icon())).unwrap();
        assert_eq!(*image.get_pixel(200, 200), Rgba([255, 0, 0, 255]));
        // between the icon edge (radius 40) and the halo edge (radius 48)
        assert_eq!(*image.get_pixel(200 + 44, 200), LIGHT);
        // icon corners are clipped by the circle and show the halo
        assert_eq!(*image.get_pixel(230, 230), LIGHT);
        assert_eq!(*image.get_pixel(200 + 60, 200), DARK);
    }

    #[test]
    fn transparent_icon_leaves_halo() {
        let clear = Icon::from_image(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0])).into());
        let image = compose(&solid(21), 400, Some(&clear)).unwrap();
        assert_eq!(*image.get_pixel(200, 200), LIGHT);
    }

    #[test]
    fn malformed_matrix_is_rejected() {
        let ragged = SymbolMatrix::from_rows(vec![vec![true; 3], vec![true; 2], vec![true; 3]]);
        assert!(matches!(compose(&ragged, 100, None), Err(Error::EncodingUnavailable(_))));
        let empty = SymbolMatrix::from_rows(Vec::new());
        assert!(matches!(compose(&empty, 100, None), Err(Error::EncodingUnavailable(_))));
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(matches!(compose(&solid(21), 0, None), Err(Error::InvalidSize(0))));
    }

    #[test]
    fn oversized_canvas_is_rejected_before_allocating() {
        assert!(check_canvas_size(16384).is_ok());
        assert!(matches!(
            compose(&solid(21), 16385, None),
            Err(Error::InvalidSize(16385))
        ));
        assert!(matches!(
            compose(&solid(21), u32::MAX, None),
            Err(Error::InvalidSize(u32::MAX))
        ));
    }

    #[test]
    fn tiny_canvas_does_not_panic() {
        for size in 1..12 {
            let image = compose(&solid(21), size, Some(&red_icon())).unwrap();
            assert_eq!(image.dimensions(), (size, size));
        }
    }

    #[test]
    fn output_is_deterministic() {
        let a = compose(&checkerboard(25), 333, Some(&red_icon())).unwrap();
        let b = compose(&checkerboard(25), 333, Some(&red_icon())).unwrap();
        assert_eq!(a, b);
    }
}
