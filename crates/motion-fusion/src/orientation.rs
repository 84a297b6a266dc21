use crate::matrix::{MatrixOrder, RotationMatrix};
use crate::quaternion::{EulerAngles, Quaternion};
use glam::Vec3;

/// An orientation with a lazily computed rotation-matrix view.
///
/// Storing a new quaternion invalidates the cached matrix; the next matrix
/// read recomputes it. Intended for a single owner polling the matrix more
/// often than the orientation changes (no internal synchronization).
#[derive(Debug, Clone)]
pub struct CachedOrientation {
    quaternion: Quaternion,
    order: MatrixOrder,
    matrix: Option<RotationMatrix>,
}

impl CachedOrientation {
    pub fn new(order: MatrixOrder) -> Self {
        Self {
            quaternion: Quaternion::IDENTITY,
            order,
            matrix: None,
        }
    }

    /// Replace the orientation, marking the cached matrix stale.
    pub fn set(&mut self, quaternion: Quaternion) {
        self.quaternion = quaternion;
        self.matrix = None;
    }

    pub fn quaternion(&self) -> Quaternion {
        self.quaternion
    }

    /// The rotation matrix for the current orientation, recomputed only when
    /// the orientation changed since the last read.
    pub fn matrix(&mut self) -> &RotationMatrix {
        let (q, order) = (self.quaternion, self.order);
        self.matrix.get_or_insert_with(|| q.to_rotation_matrix(order))
    }

    /// Rotate a vector by the current orientation.
    pub fn transform(&mut self, v: Vec3) -> Vec3 {
        self.matrix().transform(v)
    }

    pub fn euler_angles(&self) -> EulerAngles {
        self.quaternion.to_euler_angles()
    }
}
