use nalgebra as na;

/// A least-squares plane through a set of points.
#[derive(Clone, Copy, Debug)]
pub struct Plane {
    /// Centroid of the fitted points.
    pub center: na::Point3<f64>,
    /// Unit normal of the plane.
    pub normal: na::Vector3<f64>,
}

impl Plane {
    /// Fit a plane through `points` by SVD of the centered coordinates.
    /// Returns `None` for fewer than three points.
    /// Ref: https://en.wikipedia.org/wiki/Singular_value_decomposition#Total_least_squares_minimization
    pub fn from_points(points: &[na::Point3<f64>]) -> Option<Plane> {
        if points.len() < 3 {
            return None;
        }

        // Construct a 3*N matrix of the coordinates
        let mut coords: na::Matrix3xX<f64> = na::Matrix3xX::<f64>::from_iterator(
            points.len(),
            points.iter().flat_map(|p| [p.x, p.y, p.z].into_iter()),
        );
        let center = coords.column_mean();

        // Center the matrix; the left singular vector of the smallest
        // singular value is the plane normal
        for i in 0..coords.ncols() {
            coords.set_column(i, &(coords.column(i) - center));
        }
        let svd = coords.svd(true, true);
        let normal = svd.u?.column(2).clone_owned();

        Some(Plane {
            center: na::Point3::from(center),
            normal,
        })
    }

    /// Distance from a point to the plane, measured along the normal.
    pub fn point_plane_dist(&self, point: &na::Point3<f64>) -> f64 {
        (point - self.center).dot(&self.normal).abs() / self.normal.norm()
    }

    /// In-plane distance between the plane center and the projection of a
    /// point onto the plane.
    pub fn point_offset(&self, point: &na::Point3<f64>) -> f64 {
        let d = point - self.center;
        let n = self.normal.normalize();
        (d - n * d.dot(&n)).norm()
    }

    /// Angle in degrees between the plane normal and a vector, folded into
    /// `[0, 90]` since the normal's sign is arbitrary.
    pub fn vec_angle(&self, v: &na::Vector3<f64>) -> f64 {
        let cos = (self.normal.dot(v) / (self.normal.norm() * v.norm())).clamp(-1.0, 1.0);
        let mut rad = cos.acos();
        if rad > std::f64::consts::FRAC_PI_2 {
            rad = std::f64::consts::PI - rad;
        }
        rad.to_degrees()
    }

    /// Angle in degrees between two planes, folded into `[0, 90]`.
    pub fn dihedral(&self, plane: &Plane) -> f64 {
        self.vec_angle(&plane.normal)
    }
}
