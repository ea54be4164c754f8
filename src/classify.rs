use ndarray::{Array2, ArrayView2, Zip};

/// Three-level display contract shared by every renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DisplayClass {
    #[default]
    Background = 0,
    /// Labelled tissue that is not the current label
    Tissue = 1,
    Selected = 2,
}

impl DisplayClass {
    pub fn level(self) -> u8 {
        self as u8
    }
}

/// Mask of cells equal to `label`. A non-positive label focuses nothing.
pub fn label_mask(slice: ArrayView2<'_, f32>, label: i32) -> Array2<bool> {
    if label <= 0 {
        return Array2::from_elem(slice.raw_dim(), false);
    }
    let target = label as f32;
    slice.mapv(|v| v == target)
}

/// Classify each cell; background wins over a label match.
pub fn classify(slice: ArrayView2<'_, f32>, mask: ArrayView2<'_, bool>) -> Array2<DisplayClass> {
    let mut classes = Array2::from_elem(slice.raw_dim(), DisplayClass::Background);
    Zip::from(&mut classes)
        .and(&slice)
        .and(&mask)
        .for_each(|class, &value, &selected| {
            *class = if value.is_nan() || value <= 0.0 {
                DisplayClass::Background
            } else if selected {
                DisplayClass::Selected
            } else {
                DisplayClass::Tissue
            };
        });
    classes
}

/// Cells of `mask` on the region boundary: set, with at least one 4-neighbour
/// unset or outside the slice.
pub fn mask_outline(mask: ArrayView2<'_, bool>) -> Array2<bool> {
    let (rows, cols) = mask.dim();
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        if !mask[[r, c]] {
            return false;
        }
        let inside = |dr: isize, dc: isize| {
            let (nr, nc) = (r as isize + dr, c as isize + dc);
            nr >= 0
                && nc >= 0
                && (nr as usize) < rows
                && (nc as usize) < cols
                && mask[[nr as usize, nc as usize]]
        };
        !(inside(-1, 0) && inside(1, 0) && inside(0, -1) && inside(0, 1))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use pretty_assertions::assert_eq;

    #[test]
    fn three_level_classification() {
        let slice = array![[-1.0f32, 0.0, 2.0], [5.0, 5.0, 3.0]];
        let mask = label_mask(slice.view(), 5);
        let classes = classify(slice.view(), mask.view());
        let levels = classes.mapv(DisplayClass::level);
        assert_eq!(levels, array![[0u8, 0, 1], [2, 2, 1]]);
    }

    #[test]
    fn label_zero_selects_nothing() {
        let slice = array![[0.0f32, 0.0], [1.0, 0.0]];
        let mask = label_mask(slice.view(), 0);
        assert!(mask.iter().all(|&m| !m));
        let classes = classify(slice.view(), mask.view());
        assert!(classes.iter().all(|&c| c != DisplayClass::Selected));
    }

    #[test]
    fn outline_of_filled_square_is_its_ring() {
        let mut mask = Array2::from_elem((5, 5), false);
        for r in 1..4 {
            for c in 1..4 {
                mask[[r, c]] = true;
            }
        }
        let outline = mask_outline(mask.view());
        assert!(!outline[[2, 2]]);
        assert!(outline[[1, 1]]);
        assert!(outline[[1, 2]]);
        assert!(outline[[3, 3]]);
        assert!(!outline[[0, 0]]);
        assert_eq!(outline.iter().filter(|&&b| b).count(), 8);
    }

    #[test]
    fn outline_touching_border() {
        let mask = Array2::from_elem((2, 2), true);
        assert!(mask_outline(mask.view()).iter().all(|&b| b));
    }
}
