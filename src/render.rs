//! Turning slices into RGB images.
//!
//! Images come out in display orientation: the slice is transposed and both
//! axes reversed, so the second in-plane dimension runs bottom to top and the
//! first runs right to left (radiological convention).

use image::{Rgb, RgbImage};
use ndarray::{s, ArrayView2};

use crate::classify::{classify, mask_outline, DisplayClass};
use crate::model::LabelSlice;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub background: [u8; 3],
    pub tissue: [u8; 3],
    pub selected: [u8; 3],
    pub contour: [u8; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: [0x0A, 0x19, 0x29],
            tissue: [0x13, 0x2F, 0x4C],
            selected: [0xFF, 0x98, 0x00],
            contour: [0xFF, 0x98, 0x00],
        }
    }
}

impl Palette {
    pub fn class_color(&self, class: DisplayClass) -> [u8; 3] {
        match class {
            DisplayClass::Background => self.background,
            DisplayClass::Tissue => self.tissue,
            DisplayClass::Selected => self.selected,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Flat background / tissue / selected colors
    #[default]
    Classes,
    /// Grayscale intensities with the selected label tinted and outlined
    Intensity,
}

impl RenderMode {
    pub const ALL: [RenderMode; 2] = [RenderMode::Classes, RenderMode::Intensity];

    pub fn name(self) -> &'static str {
        match self {
            RenderMode::Classes => "Classes",
            RenderMode::Intensity => "Intensity",
        }
    }
}

/// Transpose and reverse both axes of a slice for display.
pub fn display_view<T>(slice: ArrayView2<'_, T>) -> ArrayView2<'_, T> {
    slice.reversed_axes().slice_move(s![..;-1, ..;-1])
}

fn to_image(height: usize, width: usize, mut pixel: impl FnMut(usize, usize) -> [u8; 3]) -> RgbImage {
    RgbImage::from_fn(width as u32, height as u32, |x, y| {
        Rgb(pixel(y as usize, x as usize))
    })
}

pub fn render_slice(slice: &LabelSlice, mode: RenderMode, palette: &Palette) -> RgbImage {
    let outline = mask_outline(slice.mask.view());
    match mode {
        RenderMode::Classes => {
            let classes = classify(slice.data.view(), slice.mask.view());
            render_classes(classes.view(), outline.view(), palette)
        }
        RenderMode::Intensity => {
            render_intensity(slice.data.view(), slice.mask.view(), outline.view(), palette)
        }
    }
}

pub fn render_classes(
    classes: ArrayView2<'_, DisplayClass>,
    outline: ArrayView2<'_, bool>,
    palette: &Palette,
) -> RgbImage {
    let classes = display_view(classes);
    let outline = display_view(outline);
    let (h, w) = classes.dim();
    to_image(h, w, |y, x| {
        if outline[[y, x]] {
            palette.contour
        } else {
            palette.class_color(classes[[y, x]])
        }
    })
}

/// Min/max normalised grayscale, label cells blended with the selected color.
pub fn render_intensity(
    data: ArrayView2<'_, f32>,
    mask: ArrayView2<'_, bool>,
    outline: ArrayView2<'_, bool>,
    palette: &Palette,
) -> RgbImage {
    let min = data
        .iter()
        .cloned()
        .filter(|v| v.is_finite())
        .fold(f32::INFINITY, f32::min);
    let max = data
        .iter()
        .cloned()
        .filter(|v| v.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;

    let data = display_view(data);
    let mask = display_view(mask);
    let outline = display_view(outline);
    let (h, w) = data.dim();
    to_image(h, w, |y, x| {
        if outline[[y, x]] {
            return palette.contour;
        }
        let val = data[[y, x]];
        let norm = if range > 0.0 && val.is_finite() {
            ((val - min) / range).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let gray = (norm * 255.0) as u8;
        if mask[[y, x]] {
            let tint = palette.selected;
            [
                blend(gray, tint[0]),
                blend(gray, tint[1]),
                blend(gray, tint[2]),
            ]
        } else {
            [gray, gray, gray]
        }
    })
}

fn blend(a: u8, b: u8) -> u8 {
    ((a as u16 + b as u16) / 2) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn display_view_transposes_and_flips() {
        let a = array![[1, 2, 3], [4, 5, 6]];
        let v = display_view(a.view());
        assert_eq!(v, array![[6, 3], [5, 2], [4, 1]]);
    }

    #[test]
    fn classes_use_palette_colors() {
        let palette = Palette::default();
        let classes = array![[DisplayClass::Background, DisplayClass::Tissue]];
        let outline = Array2::from_elem((1, 2), false);
        let img = render_classes(classes.view(), outline.view(), &palette);
        assert_eq!(img.dimensions(), (1, 2));
        // display row 0 is the last column of the slice
        assert_eq!(img.get_pixel(0, 0).0, palette.tissue);
        assert_eq!(img.get_pixel(0, 1).0, palette.background);
    }

    #[test]
    fn intensity_is_normalised_and_outlined() {
        let palette = Palette {
            contour: [1, 2, 3],
            ..Palette::default()
        };
        let data = array![[0.0f32], [10.0]];
        let mask = array![[false], [true]];
        let outline = mask.clone();
        let img = render_intensity(data.view(), mask.view(), outline.view(), &palette);
        assert_eq!(img.dimensions(), (2, 1));
        assert_eq!(img.get_pixel(1, 0).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(0, 0).0, [1, 2, 3]);
    }

    #[test]
    fn flat_slice_renders_black() {
        let data = Array2::from_elem((3, 3), 4.0f32);
        let mask = Array2::from_elem((3, 3), false);
        let img = render_intensity(data.view(), mask.view(), mask.view(), &Palette::default());
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn render_slice_dimensions_follow_display_view() {
        let slice = LabelSlice {
            axis: crate::axis::ViewAxis::Axial,
            index: 0,
            data: Array2::zeros((4, 6)),
            mask: Array2::from_elem((4, 6), false),
        };
        for mode in RenderMode::ALL {
            let img = render_slice(&slice, mode, &Palette::default());
            assert_eq!(img.dimensions(), (4, 6));
        }
    }
}
