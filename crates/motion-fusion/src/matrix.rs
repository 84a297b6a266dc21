use crate::quaternion::Quaternion;
use glam::Vec3;

/// Storage layout of a flat 16-element matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixOrder {
    RowMajor,
    ColumnMajor,
}

/// Homogeneous 4x4 rotation matrix.
///
/// The flat storage can be either row- or column-major so the values can be
/// handed to consumers in whichever layout they expect; `element` hides the
/// layout behind logical (row, col) indexing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationMatrix {
    values: [f32; 16],
    order: MatrixOrder,
}

impl RotationMatrix {
    pub fn identity(order: MatrixOrder) -> Self {
        let mut values = [0.0; 16];
        values[0] = 1.0;
        values[5] = 1.0;
        values[10] = 1.0;
        values[15] = 1.0;
        Self { values, order }
    }

    /// The rotation matrix of a unit quaternion.
    pub fn from_quaternion(q: &Quaternion, order: MatrixOrder) -> Self {
        let (x, y, z, w) = (q.x, q.y, q.z, q.w);
        let mut matrix = Self::identity(order);

        matrix.set_element(0, 0, 1.0 - 2.0 * (y * y) - 2.0 * (z * z));
        matrix.set_element(0, 1, 2.0 * (x * y) - 2.0 * (w * z));
        matrix.set_element(0, 2, 2.0 * (x * z) + 2.0 * (w * y));
        matrix.set_element(1, 0, 2.0 * (x * y) + 2.0 * (w * z));
        matrix.set_element(1, 1, 1.0 - 2.0 * (x * x) - 2.0 * (z * z));
        matrix.set_element(1, 2, 2.0 * (y * z) - 2.0 * (w * x));
        matrix.set_element(2, 0, 2.0 * (x * z) - 2.0 * (w * y));
        matrix.set_element(2, 1, 2.0 * (y * z) + 2.0 * (w * x));
        matrix.set_element(2, 2, 1.0 - 2.0 * (x * x) - 2.0 * (y * y));
        matrix
    }

    /// Logical (row, col) read regardless of storage order.
    pub fn element(&self, row: usize, col: usize) -> f32 {
        self.values[self.index(row, col)]
    }

    pub fn set_element(&mut self, row: usize, col: usize, value: f32) {
        let index = self.index(row, col);
        self.values[index] = value;
    }

    pub fn order(&self) -> MatrixOrder {
        self.order
    }

    /// The flat storage, laid out per `order`.
    pub fn values(&self) -> &[f32; 16] {
        &self.values
    }

    /// Rotate a vector (homogeneous transform with w = 1).
    pub fn transform(&self, v: Vec3) -> Vec3 {
        Vec3::new(
            self.element(0, 0) * v.x + self.element(0, 1) * v.y + self.element(0, 2) * v.z,
            self.element(1, 0) * v.x + self.element(1, 1) * v.y + self.element(1, 2) * v.z,
            self.element(2, 0) * v.x + self.element(2, 1) * v.y + self.element(2, 2) * v.z,
        )
    }

    fn index(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < 4 && col < 4);
        match self.order {
            MatrixOrder::RowMajor => row * 4 + col,
            MatrixOrder::ColumnMajor => col * 4 + row,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_transform_is_noop() {
        let m = RotationMatrix::identity(MatrixOrder::RowMajor);
        let v = Vec3::new(1.0, -2.0, 3.0);
        assert!((m.transform(v) - v).length() < 1e-6);
    }

    #[test]
    fn storage_orders_agree_on_logical_elements() {
        let q = Quaternion::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), 30.0);
        let row = RotationMatrix::from_quaternion(&q, MatrixOrder::RowMajor);
        let col = RotationMatrix::from_quaternion(&q, MatrixOrder::ColumnMajor);
        for r in 0..4 {
            for c in 0..4 {
                assert!((row.element(r, c) - col.element(r, c)).abs() < 1e-6);
            }
        }
        // The flat buffers are transposes of each other.
        assert!((row.values()[1] - col.values()[4]).abs() < 1e-6);
    }

    #[test]
    fn quarter_turn_about_y_maps_x_to_negative_z() {
        let q = Quaternion::from_axis_angle(Vec3::Y, 90.0);
        let m = q.to_rotation_matrix(MatrixOrder::RowMajor);
        let out = m.transform(Vec3::X);
        assert!((out - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }
}
