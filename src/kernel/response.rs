//! Response surfaces produced by the correlation kernels.

use crate::kernel::method::Extremum;

/// Location and value of a response extremum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    pub x: usize,
    pub y: usize,
    pub value: f32,
}

/// Dense row-major score surface, one cell per template placement.
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseMap {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl ResponseMap {
    pub(crate) fn from_vec(data: Vec<f32>, width: usize, height: usize) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    /// Finds the extremum, keeping the first occurrence in row-major order.
    pub fn locate(&self, extremum: Extremum) -> Option<Peak> {
        let mut best: Option<Peak> = None;
        for (idx, &value) in self.data.iter().enumerate() {
            if value.is_nan() {
                continue;
            }
            let replace = match best {
                None => true,
                Some(current) => extremum.better(value, current.value),
            };
            if replace {
                best = Some(Peak {
                    x: idx % self.width,
                    y: idx / self.width,
                    value,
                });
            }
        }
        best
    }

    /// Overwrites `[x0, x1) x [y0, y1)` with `value`, clipped to the surface.
    pub fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, value: f32) {
        let x0 = x0.clamp(0, self.width as i64) as usize;
        let x1 = x1.clamp(0, self.width as i64) as usize;
        let y0 = y0.clamp(0, self.height as i64) as usize;
        let y1 = y1.clamp(0, self.height as i64) as usize;
        if x0 >= x1 {
            return;
        }
        for y in y0..y1 {
            let start = y * self.width;
            self.data[start + x0..start + x1].fill(value);
        }
    }

    /// True when `(x, y)` touches the outermost row or column.
    pub fn is_on_border(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x + 1 >= self.width || y + 1 >= self.height
    }

    /// Returns the 3x3 values around `(x, y)` indexed `[dy + 1][dx + 1]`.
    pub fn neighborhood(&self, x: usize, y: usize) -> Option<[[f32; 3]; 3]> {
        if self.is_on_border(x, y) {
            return None;
        }
        let mut out = [[0.0f32; 3]; 3];
        for (dy, row) in out.iter_mut().enumerate() {
            for (dx, cell) in row.iter_mut().enumerate() {
                *cell = self.get(x + dx - 1, y + dy - 1)?;
            }
        }
        Some(out)
    }
}
