//! # Geometry
//!
//! Bounds, affine transforms, and the point-in-local-space math that shape handlers build on.
//! Everything here is pure. Units are logical pixels, 0,0 is top left, +X right, +Y down.

/// An axis-aligned bounding box. `min <= max` componentwise.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: [f32; 2],
    pub max: [f32; 2],
}
impl Aabb {
    /// Create from two arbitrary corners.
    #[must_use]
    pub fn from_corners(a: [f32; 2], b: [f32; 2]) -> Self {
        Self {
            min: [a[0].min(b[0]), a[1].min(b[1])],
            max: [a[0].max(b[0]), a[1].max(b[1])],
        }
    }
    #[must_use]
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::from_corners([x, y], [x + width, y + height])
    }
    /// Smallest box containing every point, or None if there are none.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f32; 2]>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = *points.next()?;
        Some(points.fold(
            Self {
                min: first,
                max: first,
            },
            |acc, p| acc.union(&Self { min: *p, max: *p }),
        ))
    }
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max[0] - self.min[0]
    }
    #[must_use]
    pub fn height(&self) -> f32 {
        self.max[1] - self.min[1]
    }
    #[must_use]
    pub fn center(&self) -> [f32; 2] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
        ]
    }
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: [self.min[0].min(other.min[0]), self.min[1].min(other.min[1])],
            max: [self.max[0].max(other.max[0]), self.max[1].max(other.max[1])],
        }
    }
    /// Closed-interval overlap test, so boxes sharing an edge intersect.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min[0] <= other.max[0]
            && other.min[0] <= self.max[0]
            && self.min[1] <= other.max[1]
            && other.min[1] <= self.max[1]
    }
    #[must_use]
    pub fn contains(&self, point: [f32; 2]) -> bool {
        point[0] >= self.min[0]
            && point[0] <= self.max[0]
            && point[1] >= self.min[1]
            && point[1] <= self.max[1]
    }
    /// Grow every edge by `amount`.
    #[must_use]
    pub fn outset(&self, amount: f32) -> Self {
        Self {
            min: [self.min[0] - amount, self.min[1] - amount],
            max: [self.max[0] + amount, self.max[1] + amount],
        }
    }
    #[must_use]
    pub fn corners(&self) -> [[f32; 2]; 4] {
        [
            self.min,
            [self.max[0], self.min[1]],
            self.max,
            [self.min[0], self.max[1]],
        ]
    }
}

/// The decomposed placement of a shape: translate × rotate × scale × translate(-origin).
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    /// Translation, in logical pixels.
    pub translation: [f32; 2],
    /// Rotation, in radians CW from positive X (as +Y is down).
    pub rotation: f32,
    pub scale: [f32; 2],
    /// Pivot of rotation and scale, in shape-local space.
    pub origin: [f32; 2],
}
impl Transform {
    pub const IDENTITY: Self = Self {
        translation: [0.0; 2],
        rotation: 0.0,
        scale: [1.0; 2],
        origin: [0.0; 2],
    };
    #[must_use]
    pub fn from_translation(translation: [f32; 2]) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
    #[must_use]
    pub fn matrix(&self) -> Matrix {
        Matrix::from(*self)
    }
}
impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// An arbitrary affine transform.
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable, PartialEq)]
#[repr(C)]
pub struct Matrix {
    /// Column-major matrix elements. The last column is the translation.
    pub elements: [[f32; 2]; 3],
}
impl Matrix {
    pub const IDENTITY: Self = Self {
        elements: [[1.0, 0.0], [0.0, 1.0], [0.0, 0.0]],
    };
    #[must_use]
    pub fn translate(x: f32, y: f32) -> Self {
        Self {
            elements: [[1.0, 0.0], [0.0, 1.0], [x, y]],
        }
    }
    #[must_use]
    pub fn scale(x: f32, y: f32) -> Self {
        Self {
            elements: [[x, 0.0], [0.0, y], [0.0, 0.0]],
        }
    }
    #[must_use]
    pub fn rotate(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            elements: [[cos, sin], [-sin, cos], [0.0, 0.0]],
        }
    }
    /// `self * rhs`, ie. `rhs` is applied first.
    #[must_use]
    pub fn then_after(&self, rhs: &Self) -> Self {
        let [a0, a1, a2] = self.elements;
        let [b0, b1, b2] = rhs.elements;
        let mul = |col: [f32; 2]| {
            [
                a0[0] * col[0] + a1[0] * col[1],
                a0[1] * col[0] + a1[1] * col[1],
            ]
        };
        let t = mul(b2);
        Self {
            elements: [mul(b0), mul(b1), [t[0] + a2[0], t[1] + a2[1]]],
        }
    }
    #[must_use]
    pub fn determinant(&self) -> f32 {
        let [c0, c1, _] = self.elements;
        c0[0] * c1[1] - c1[0] * c0[1]
    }
    /// The inverse transform, or None if the matrix is singular (eg. a zero scale).
    #[must_use]
    pub fn invert(&self) -> Option<Self> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < f32::EPSILON {
            return None;
        }
        let [[a, b], [c, d], [e, f]] = self.elements;
        let inv_det = det.recip();
        let ia = d * inv_det;
        let ib = -b * inv_det;
        let ic = -c * inv_det;
        let id = a * inv_det;
        Some(Self {
            elements: [
                [ia, ib],
                [ic, id],
                [-(ia * e + ic * f), -(ib * e + id * f)],
            ],
        })
    }
    #[must_use]
    pub fn apply(&self, point: [f32; 2]) -> [f32; 2] {
        let [[a, b], [c, d], [e, f]] = self.elements;
        [
            a * point[0] + c * point[1] + e,
            b * point[0] + d * point[1] + f,
        ]
    }
    /// Axis-aligned bounds of a transformed box.
    #[must_use]
    pub fn apply_aabb(&self, aabb: &Aabb) -> Aabb {
        let [first, rest @ ..] = aabb.corners().map(|corner| self.apply(corner));
        rest.iter().fold(
            Aabb {
                min: first,
                max: first,
            },
            |acc, p| acc.union(&Aabb { min: *p, max: *p }),
        )
    }
    /// Row-major `(sx, ky, kx, sy, tx, ty)`, the order `tiny_skia::Transform::from_row` takes.
    #[must_use]
    pub fn to_row(&self) -> [f32; 6] {
        let [[a, b], [c, d], [e, f]] = self.elements;
        [a, b, c, d, e, f]
    }
}
impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}
impl From<Transform> for Matrix {
    fn from(value: Transform) -> Self {
        Matrix::translate(value.translation[0], value.translation[1])
            .then_after(&Matrix::rotate(value.rotation))
            .then_after(&Matrix::scale(value.scale[0], value.scale[1]))
            .then_after(&Matrix::translate(-value.origin[0], -value.origin[1]))
    }
}

/// Map a document-space point into a transform's local space.
/// None if the transform cannot be inverted.
#[must_use]
pub fn to_local(transform: &Transform, point: [f32; 2]) -> Option<[f32; 2]> {
    Some(transform.matrix().invert()?.apply(point))
}

/// Squared distance from `point` to the segment `a..b`.
#[must_use]
pub fn distance_sq_to_segment(point: [f32; 2], a: [f32; 2], b: [f32; 2]) -> f32 {
    let ab = [b[0] - a[0], b[1] - a[1]];
    let ap = [point[0] - a[0], point[1] - a[1]];
    let len_sq = ab[0] * ab[0] + ab[1] * ab[1];
    let t = if len_sq > 0.0 {
        ((ap[0] * ab[0] + ap[1] * ab[1]) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let closest = [a[0] + ab[0] * t, a[1] + ab[1] * t];
    let d = [point[0] - closest[0], point[1] - closest[1]];
    d[0] * d[0] + d[1] * d[1]
}
