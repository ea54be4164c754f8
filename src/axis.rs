use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use crate::error::ModelError;

/// One of the three orthogonal viewing directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewAxis {
    Axial,
    Coronal,
    Sagittal,
}

impl ViewAxis {
    pub const ALL: [ViewAxis; 3] = [ViewAxis::Axial, ViewAxis::Coronal, ViewAxis::Sagittal];

    /// Volume dimension this view slices through.
    pub fn dim(self) -> usize {
        match self {
            ViewAxis::Axial => 2,
            ViewAxis::Coronal => 1,
            ViewAxis::Sagittal => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ViewAxis::Axial => "Axial",
            ViewAxis::Coronal => "Coronal",
            ViewAxis::Sagittal => "Sagittal",
        }
    }

    /// The two volume dimensions that remain in a slice, in storage order.
    pub fn in_plane_dims(self) -> (usize, usize) {
        match self {
            ViewAxis::Axial => (0, 1),
            ViewAxis::Coronal => (0, 2),
            ViewAxis::Sagittal => (1, 2),
        }
    }
}

impl fmt::Display for ViewAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ViewAxis {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "axial" => Ok(ViewAxis::Axial),
            "coronal" => Ok(ViewAxis::Coronal),
            "sagittal" => Ok(ViewAxis::Sagittal),
            _ => Err(ModelError::InvalidAxis(s.to_string())),
        }
    }
}

/// A value for each of the three view axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PerAxis<T> {
    pub axial: T,
    pub coronal: T,
    pub sagittal: T,
}

impl<T> PerAxis<T> {
    pub fn from_fn(mut f: impl FnMut(ViewAxis) -> T) -> Self {
        PerAxis {
            axial: f(ViewAxis::Axial),
            coronal: f(ViewAxis::Coronal),
            sagittal: f(ViewAxis::Sagittal),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ViewAxis, &T)> {
        ViewAxis::ALL.into_iter().map(move |axis| (axis, &self[axis]))
    }
}

impl<T> Index<ViewAxis> for PerAxis<T> {
    type Output = T;

    fn index(&self, axis: ViewAxis) -> &T {
        match axis {
            ViewAxis::Axial => &self.axial,
            ViewAxis::Coronal => &self.coronal,
            ViewAxis::Sagittal => &self.sagittal,
        }
    }
}

impl<T> IndexMut<ViewAxis> for PerAxis<T> {
    fn index_mut(&mut self, axis: ViewAxis) -> &mut T {
        match axis {
            ViewAxis::Axial => &mut self.axial,
            ViewAxis::Coronal => &mut self.coronal,
            ViewAxis::Sagittal => &mut self.sagittal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axes_map_to_fixed_dimensions() {
        assert_eq!(ViewAxis::Axial.dim(), 2);
        assert_eq!(ViewAxis::Coronal.dim(), 1);
        assert_eq!(ViewAxis::Sagittal.dim(), 0);
        for axis in ViewAxis::ALL {
            let (a, b) = axis.in_plane_dims();
            assert!(a < b);
            assert_ne!(a, axis.dim());
            assert_ne!(b, axis.dim());
        }
    }

    #[test]
    fn parses_view_names() {
        assert_eq!("axial".parse::<ViewAxis>().unwrap(), ViewAxis::Axial);
        assert_eq!("Coronal".parse::<ViewAxis>().unwrap(), ViewAxis::Coronal);
        assert_eq!(" SAGITTAL ".parse::<ViewAxis>().unwrap(), ViewAxis::Sagittal);
        assert!(matches!(
            "oblique".parse::<ViewAxis>(),
            Err(ModelError::InvalidAxis(name)) if name == "oblique"
        ));
    }

    #[test]
    fn per_axis_indexing() {
        let mut values = PerAxis::from_fn(|axis| axis.dim());
        assert_eq!(values[ViewAxis::Axial], 2);
        values[ViewAxis::Sagittal] = 7;
        assert_eq!(values.sagittal, 7);
        let order: Vec<_> = values.iter().map(|(axis, _)| axis).collect();
        assert_eq!(order, ViewAxis::ALL.to_vec());
    }
}
