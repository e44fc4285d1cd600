use super::{HardwareProfile, Wiring};

/// Logical (x, y) to physical pixel index lookup, built once per profile.
///
/// Panels are tiled `chain_length` wide and `parallel` high. The physical
/// buffer is panel-major: all pixels of panel 0, then panel 1, counting along
/// the chain first. Inside a panel, pixels follow the profile's wiring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateMap {
    width: usize,
    height: usize,
    forward: Box<[u32]>,
    inverse: Box<[u32]>,
}

impl CoordinateMap {
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(profile: &HardwareProfile) -> Self {
        let width = profile.width();
        let height = profile.height();
        let mut forward = vec![0u32; width * height].into_boxed_slice();
        let mut inverse = vec![0u32; width * height].into_boxed_slice();

        for y in 0..height {
            for x in 0..width {
                let logical = y * width + x;
                let physical = physical_index(profile, x, y);
                forward[logical] = physical as u32;
                inverse[physical] = logical as u32;
            }
        }

        Self {
            width,
            height,
            forward,
            inverse,
        }
    }

    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    pub const fn len(&self) -> usize {
        self.width * self.height
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Physical index of a logical coordinate, `None` when out of range
    #[inline]
    pub fn map(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.forward[y * self.width + x] as usize)
    }

    /// Logical coordinate of a physical index
    #[inline]
    pub fn unmap(&self, index: usize) -> Option<(usize, usize)> {
        let logical = *self.inverse.get(index)? as usize;
        Some((logical % self.width, logical / self.width))
    }
}

fn physical_index(profile: &HardwareProfile, x: usize, y: usize) -> usize {
    let cols = profile.cols as usize;
    let rows = profile.rows as usize;
    let panel = (y / rows) * profile.chain_length as usize + x / cols;
    let (local_x, local_y) = (x % cols, y % rows);

    let local = match profile.wiring {
        Wiring::Serpentine if local_y % 2 == 1 => local_y * cols + (cols - 1 - local_x),
        Wiring::Serpentine | Wiring::Progressive => local_y * cols + local_x,
    };
    panel * profile.panel_pixels() + local
}
