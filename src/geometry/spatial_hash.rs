use nalgebra as na;

/// Default cell width exponent: cells are `2^3 = 8` length units wide.
const DEFAULT_CELL_EXP: usize = 3;

/// Upper bound on the dense grid size. The cell width is doubled until the
/// grid fits, so pathological coordinate ranges degrade to coarser cells
/// instead of exhausting memory.
const MAX_GRID_CELLS: usize = 1 << 22;

/// A uniform grid over a set of points for fixed-radius neighbor queries.
///
/// Points are binned into cubic cells of width `2^cell_exp`. The grid is a
/// dense lookup table from cell index to a bucket of point indices, stored
/// in flat arrays. Queries visit only the cells overlapping the search
/// sphere's bounding box and filter candidates by true squared distance.
#[derive(Debug, Clone)]
pub struct SpatialHash {
    cell_exp: usize,
    min: na::Point3<f64>,
    dim_x: usize,
    dim_y: usize,
    dim_z: usize,
    /// Dense cell table: `0` means empty, otherwise bucket index + 1.
    grid: Vec<u32>,
    bucket_offset: Vec<u32>,
    bucket_count: Vec<u32>,
    entries: Vec<u32>,
    points: Vec<na::Point3<f64>>,
}

impl SpatialHash {
    /// Build a spatial hash over `points`.
    pub fn new(points: &[na::Point3<f64>]) -> Self {
        if points.is_empty() {
            return Self {
                cell_exp: DEFAULT_CELL_EXP,
                min: na::Point3::origin(),
                dim_x: 0,
                dim_y: 0,
                dim_z: 0,
                grid: Vec::new(),
                bucket_offset: Vec::new(),
                bucket_count: Vec::new(),
                entries: Vec::new(),
                points: Vec::new(),
            };
        }

        let mut min = points[0];
        let mut max = points[0];
        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        let mut cell_exp = DEFAULT_CELL_EXP;
        let (dim_x, dim_y, dim_z) = loop {
            let dim_x = (((max.x - min.x) as usize) >> cell_exp) + 1;
            let dim_y = (((max.y - min.y) as usize) >> cell_exp) + 1;
            let dim_z = (((max.z - min.z) as usize) >> cell_exp) + 1;
            let cells = dim_x
                .checked_mul(dim_y)
                .and_then(|c| c.checked_mul(dim_z));
            match cells {
                Some(c) if c <= MAX_GRID_CELLS => break (dim_x, dim_y, dim_z),
                _ => cell_exp += 1,
            }
        };

        // First pass: count points per cell and remember each point's cell
        let mut grid = vec![0u32; dim_x * dim_y * dim_z];
        let mut point_cell = vec![0usize; points.len()];
        let mut used_cells = 0usize;
        for (i, p) in points.iter().enumerate() {
            let x = ((p.x - min.x) as usize) >> cell_exp;
            let y = ((p.y - min.y) as usize) >> cell_exp;
            let z = ((p.z - min.z) as usize) >> cell_exp;
            let idx = (x * dim_y + y) * dim_z + z;
            if grid[idx] == 0 {
                used_cells += 1;
            }
            grid[idx] += 1;
            point_cell[i] = idx;
        }

        // Second pass: assign bucket slots to used cells
        let mut bucket_count = vec![0u32; used_cells];
        let mut bucket = 0u32;
        for cell in grid.iter_mut() {
            if *cell > 0 {
                bucket_count[bucket as usize] = *cell;
                *cell = bucket + 1;
                bucket += 1;
            }
        }

        let mut bucket_offset = vec![0u32; used_cells];
        let mut offset = 0u32;
        for (i, count) in bucket_count.iter().enumerate() {
            bucket_offset[i] = offset;
            offset += count;
        }

        // Third pass: scatter point indices into their buckets
        let mut bucket_fill = vec![0u32; used_cells];
        let mut entries = vec![0u32; points.len()];
        for (i, &cell) in point_cell.iter().enumerate() {
            let b = (grid[cell] - 1) as usize;
            entries[(bucket_offset[b] + bucket_fill[b]) as usize] = i as u32;
            bucket_fill[b] += 1;
        }

        Self {
            cell_exp,
            min,
            dim_x,
            dim_y,
            dim_z,
            grid,
            bucket_offset,
            bucket_count,
            entries,
            points: points.to_vec(),
        }
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// `true` if no points are indexed.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Call `callback(index, dist_sq)` for every point within `radius` of
    /// `center`. Points exactly at `radius` are included.
    pub fn each_within<F>(&self, center: &na::Point3<f64>, radius: f64, mut callback: F)
    where
        F: FnMut(u32, f64),
    {
        if self.points.is_empty() || radius < 0.0 {
            return;
        }
        let radius_sq = radius * radius;

        let lo_x = (((center.x - radius - self.min.x).max(0.0)) as usize) >> self.cell_exp;
        let lo_y = (((center.y - radius - self.min.y).max(0.0)) as usize) >> self.cell_exp;
        let lo_z = (((center.z - radius - self.min.z).max(0.0)) as usize) >> self.cell_exp;
        let hi_x = self
            .dim_x
            .min(((((center.x + radius - self.min.x).max(0.0)) as usize) >> self.cell_exp) + 1);
        let hi_y = self
            .dim_y
            .min(((((center.y + radius - self.min.y).max(0.0)) as usize) >> self.cell_exp) + 1);
        let hi_z = self
            .dim_z
            .min(((((center.z + radius - self.min.z).max(0.0)) as usize) >> self.cell_exp) + 1);

        for x in lo_x..hi_x {
            for y in lo_y..hi_y {
                for z in lo_z..hi_z {
                    let bucket = self.grid[(x * self.dim_y + y) * self.dim_z + z];
                    if bucket == 0 {
                        continue;
                    }
                    let b = (bucket - 1) as usize;
                    let start = self.bucket_offset[b] as usize;
                    let end = start + self.bucket_count[b] as usize;
                    for &index in &self.entries[start..end] {
                        let dist_sq = (self.points[index as usize] - center).norm_squared();
                        if dist_sq <= radius_sq {
                            callback(index, dist_sq);
                        }
                    }
                }
            }
        }
    }

    /// Collect the indices of all points within `radius` of `center`.
    pub fn within(&self, center: &na::Point3<f64>, radius: f64) -> Vec<u32> {
        let mut result = Vec::new();
        self.each_within(center, radius, |index, _| result.push(index));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn brute_force(points: &[na::Point3<f64>], center: &na::Point3<f64>, radius: f64) -> Vec<u32> {
        points
            .iter()
            .enumerate()
            .filter(|(_, p)| (*p - center).norm_squared() <= radius * radius)
            .map(|(i, _)| i as u32)
            .collect()
    }

    #[test]
    fn test_empty() {
        let hash = SpatialHash::new(&[]);
        assert!(hash.is_empty());
        assert!(hash.within(&na::Point3::new(0.0, 0.0, 0.0), 10.0).is_empty());
    }

    #[test]
    fn test_single_point() {
        let points = vec![na::Point3::new(1.0, 2.0, 3.0)];
        let hash = SpatialHash::new(&points);
        assert_eq!(hash.len(), 1);
        assert_eq!(hash.within(&na::Point3::new(1.0, 2.0, 3.0), 0.0), vec![0]);
        assert_eq!(hash.within(&na::Point3::new(1.0, 2.0, 4.5), 1.0), Vec::<u32>::new());
        assert_eq!(hash.within(&na::Point3::new(1.0, 2.0, 4.0), 1.0), vec![0]);
    }

    #[test]
    fn test_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);
        let points: Vec<na::Point3<f64>> = (0..500)
            .map(|_| {
                na::Point3::new(
                    rng.gen_range(-30.0..30.0),
                    rng.gen_range(-30.0..30.0),
                    rng.gen_range(-30.0..30.0),
                )
            })
            .collect();
        let hash = SpatialHash::new(&points);

        for _ in 0..50 {
            let center = na::Point3::new(
                rng.gen_range(-35.0..35.0),
                rng.gen_range(-35.0..35.0),
                rng.gen_range(-35.0..35.0),
            );
            let radius = rng.gen_range(0.5..12.0);
            let mut found = hash.within(&center, radius);
            found.sort_unstable();
            assert_eq!(found, brute_force(&points, &center, radius));
        }
    }

    #[test]
    fn test_reports_true_squared_distance() {
        let points = vec![
            na::Point3::new(0.0, 0.0, 0.0),
            na::Point3::new(3.0, 4.0, 0.0),
            na::Point3::new(20.0, 0.0, 0.0),
        ];
        let hash = SpatialHash::new(&points);
        let mut found = Vec::new();
        hash.each_within(&na::Point3::new(0.0, 0.0, 0.0), 6.0, |i, d_sq| {
            found.push((i, d_sq));
        });
        found.sort_by_key(|&(i, _)| i);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0], (0, 0.0));
        assert!((found[1].1 - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_duplicate_points() {
        let p = na::Point3::new(-5.0, -5.0, -5.0);
        let points = vec![p, p, p];
        let hash = SpatialHash::new(&points);
        let mut found = hash.within(&p, 0.1);
        found.sort_unstable();
        assert_eq!(found, vec![0, 1, 2]);
    }

    #[test]
    fn test_query_far_outside_bounds() {
        let points = vec![na::Point3::new(0.0, 0.0, 0.0), na::Point3::new(1.0, 1.0, 1.0)];
        let hash = SpatialHash::new(&points);
        assert!(hash.within(&na::Point3::new(500.0, 500.0, 500.0), 2.0).is_empty());
        assert!(hash.within(&na::Point3::new(-500.0, 0.0, 0.0), 2.0).is_empty());
        // A huge radius from far away still finds everything
        assert_eq!(hash.within(&na::Point3::new(-500.0, 0.0, 0.0), 1000.0).len(), 2);
    }
}
