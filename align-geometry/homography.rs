use imageproc::geometric_transformations::Projection;
use nalgebra::{Matrix3, SMatrix, SVector, Vector3};
use std::fmt;

/// Projective transform mapping destination pixels onto reference pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    // row-major 3x3, normalised so that h[2][2] == 1
    pub h: [[f64; 3]; 3],
}

impl Homography {
    pub fn identity() -> Self {
        Self {
            h: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Pure translation by `(dx, dy)`
    pub fn from_translation(dx: f64, dy: f64) -> Self {
        Self {
            h: [[1.0, 0.0, dx], [0.0, 1.0, dy], [0.0, 0.0, 1.0]],
        }
    }

    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let w = self.h[2][0] * x + self.h[2][1] * y + self.h[2][2];
        let u = (self.h[0][0] * x + self.h[0][1] * y + self.h[0][2]) / w;
        let v = (self.h[1][0] * x + self.h[1][1] * y + self.h[1][2]) / w;
        (u, v)
    }

    /// Translation part `(h02, h12) / h22`
    pub fn translation(&self) -> (f64, f64) {
        (self.h[0][2] / self.h[2][2], self.h[1][2] / self.h[2][2])
    }

    pub fn determinant(&self) -> f64 {
        self.matrix().determinant()
    }

    pub fn is_finite(&self) -> bool {
        self.h.iter().flatten().all(|v| v.is_finite())
    }

    pub fn inverse(&self) -> Option<Self> {
        self.matrix().try_inverse().and_then(Self::from_matrix)
    }

    /// Row-major coefficients
    pub fn to_array(&self) -> [f64; 9] {
        let h = &self.h;
        [h[0][0], h[0][1], h[0][2], h[1][0], h[1][1], h[1][2], h[2][0], h[2][1], h[2][2]]
    }

    /// Warp projection for `imageproc`; `None` when the matrix is not invertible
    pub fn to_projection(&self) -> Option<Projection> {
        Projection::from_matrix(self.to_array().map(|v| v as f32))
    }

    fn matrix(&self) -> Matrix3<f64> {
        Matrix3::from_row_slice(&self.to_array())
    }

    /// Rescale so the bottom-right entry is 1
    fn from_matrix(m: Matrix3<f64>) -> Option<Self> {
        let s = m[(2, 2)];
        if s.abs() < 1e-12 || !s.is_finite() {
            return None;
        }
        let m = m / s;
        Some(Self {
            h: [
                [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
                [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
                [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
            ],
        })
    }
}

impl Default for Homography {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Display for Homography {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.h.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "[{:12.6}, {:12.6}, {:12.6}]", row[0], row[1], row[2])?;
        }
        Ok(())
    }
}

fn normalize_points(pts: &[(f64, f64)]) -> (Vec<(f64, f64)>, Matrix3<f64>) {
    // Hartley normalization: translate to centroid, scale so mean distance = sqrt(2)
    let n = pts.len() as f64;
    let cx = pts.iter().map(|p| p.0).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p.1).sum::<f64>() / n;

    let mean_dist = pts
        .iter()
        .map(|p| ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    let s = if mean_dist > 1e-12 {
        (2.0_f64).sqrt() / mean_dist
    } else {
        1.0
    };

    let t = Matrix3::<f64>::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);

    let out = pts
        .iter()
        .map(|&(x, y)| {
            let v = t * Vector3::new(x, y, 1.0);
            (v[0], v[1])
        })
        .collect();
    (out, t)
}

/// Estimate H such that `dst ~ H * src` from four or more point pairs.
///
/// Normalised DLT: the solution is the eigenvector of `AᵀA` with the
/// smallest eigenvalue. Returns `None` for fewer than four pairs, mismatched
/// lengths, or a result that cannot be scaled to `h22 = 1`.
pub fn estimate_homography(src: &[(f64, f64)], dst: &[(f64, f64)]) -> Option<Homography> {
    if src.len() != dst.len() || src.len() < 4 {
        return None;
    }

    let (s, ts) = normalize_points(src);
    let (d, td) = normalize_points(dst);

    let mut ata = SMatrix::<f64, 9, 9>::zeros();
    for (&(x, y), &(u, v)) in s.iter().zip(d.iter()) {
        // [ -x -y -1   0  0  0   u*x u*y u ]
        let r1 = SVector::<f64, 9>::from_column_slice(&[-x, -y, -1.0, 0.0, 0.0, 0.0, u * x, u * y, u]);
        // [ 0  0  0  -x -y -1   v*x v*y v ]
        let r2 = SVector::<f64, 9>::from_column_slice(&[0.0, 0.0, 0.0, -x, -y, -1.0, v * x, v * y, v]);
        ata += r1 * r1.transpose() + r2 * r2.transpose();
    }

    let eigen = ata.symmetric_eigen();
    let (min_idx, _) = eigen
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))?;
    let h = eigen.eigenvectors.column(min_idx);

    let hn = Matrix3::<f64>::from_row_slice(&[h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]]);

    // Denormalize: H = Td^{-1} * Hn * Ts
    let td_inv = td.try_inverse()?;
    Homography::from_matrix(td_inv * hn * ts)
}
