use glam::{Mat4, Vec3};

/// Axis aligned bounding box.
///
/// An invalid box is the identity element of [`BoundingBox::merge`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
    pub valid: bool,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::INVALID
    }
}

impl BoundingBox {
    pub const INVALID: BoundingBox = BoundingBox {
        min: Vec3::ZERO,
        max: Vec3::ZERO,
        valid: false,
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min,
            max,
            valid: true,
        }
    }

    pub fn merge(&self, other: &BoundingBox) -> BoundingBox {
        match (self.valid, other.valid) {
            (false, _) => *other,
            (_, false) => *self,
            (true, true) => BoundingBox::new(self.min.min(other.min), self.max.max(other.max)),
        }
    }

    pub fn merge_in_place(&mut self, other: &BoundingBox) {
        *self = self.merge(other);
    }

    /// Box enclosing this box after transforming it by `matrix`.
    ///
    /// Uses Arvo's method: every axis of the matrix contributes the min and
    /// max of its products with the box extents.
    pub fn transformed(&self, matrix: &Mat4) -> BoundingBox {
        if !self.valid {
            return BoundingBox::INVALID;
        }
        let mut min = matrix.w_axis.truncate();
        let mut max = min;

        let axes = [
            (matrix.x_axis.truncate(), self.min.x, self.max.x),
            (matrix.y_axis.truncate(), self.min.y, self.max.y),
            (matrix.z_axis.truncate(), self.min.z, self.max.z),
        ];
        for (axis, low, high) in axes {
            let a = axis * low;
            let b = axis * high;
            min += a.min(b);
            max += a.max(b);
        }

        BoundingBox::new(min, max)
    }

    pub fn size(&self) -> Vec3 {
        if self.valid {
            self.max - self.min
        } else {
            Vec3::ZERO
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}
