//! Triangle cell implementation
//!
//! A [`TriCell`] is one triangle of the navigation mesh and one node of its
//! adjacency graph. Cells live in an arena owned by the mesh and refer to each
//! other through [`CellRef`] indices, never through pointers.

use glam::{Vec2, Vec3};
use trinav_common::{
    closest_point_on_segment_2d, dist_point_segment_sqr_2d, distance, distance_squared,
    intersect_segments_2d, point_in_triangle_2d, tri_area_2d, Error, Result,
};

use crate::cell_quad_tree::Aabb;

/// Tolerance used when classifying a point against a wall
pub const WALL_TOLERANCE: f32 = 1e-4;

/// Tolerance used when matching the vertices of two walls during linking
pub const VERTEX_MATCH_TOLERANCE: f32 = 1e-4;

/// Reference to a cell in the mesh arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef(u32);

impl CellRef {
    /// Creates a new cell reference from an arena index
    #[inline]
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Gets the arena index
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// Gets the raw id
    #[inline]
    pub fn id(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CellRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cell#{}", self.0)
    }
}

/// Neighbor link stored per wall
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellLink {
    cell: u32,
    wall: u8,
}

impl CellLink {
    /// Sentinel meaning "solid wall"
    const NONE: CellLink = CellLink {
        cell: u32::MAX,
        wall: u8::MAX,
    };

    fn is_set(&self) -> bool {
        self.cell != u32::MAX
    }
}

/// Relationship between a directed 2D line segment and a cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathRelationship {
    /// The segment ends inside the cell
    EndingCell,
    /// The segment leaves the cell through `wall` at `point`
    ExitingCell { wall: usize, point: Vec3 },
    /// The segment neither ends in nor leaves the cell
    NoRelationship,
}

/// A triangle cell of the navigation mesh
#[derive(Debug, Clone)]
pub struct TriCell {
    /// Indices into the mesh vertex buffer
    indices: [u32; 3],
    /// Vertex positions, wound clockwise
    verts: [Vec3; 3],
    centroid: Vec3,
    /// Plane normal, always pointing up
    normal: Vec3,
    /// Plane `d` constant (`normal . p + d = 0`)
    d: f32,
    /// Outward XZ normal of each wall
    wall_normals: [Vec2; 3],
    wall_midpoints: [Vec3; 3],
    /// Distances between wall midpoints: (0,1), (1,2), (2,0)
    midpoint_distances: [f32; 3],
    bounds: Aabb,
    links: [CellLink; 3],
}

impl TriCell {
    /// Creates a cell from three vertex indices and their positions.
    ///
    /// Fails when the footprint is degenerate or wound counter-clockwise.
    pub fn new(indices: [u32; 3], verts: [Vec3; 3]) -> Result<Self> {
        let [a, b, c] = verts;

        let area = tri_area_2d(&a, &b, &c);
        if area.abs() <= f32::EPSILON {
            return Err(Error::InvalidMesh(format!(
                "degenerate triangle {:?}",
                indices
            )));
        }
        if area < 0.0 {
            return Err(Error::InvalidMesh(format!(
                "triangle {:?} is not wound clockwise",
                indices
            )));
        }

        let mut normal = (b - a).cross(c - a).normalize_or_zero();
        if normal.y < 0.0 {
            normal = -normal;
        }
        if normal.y.abs() <= f32::EPSILON {
            return Err(Error::InvalidMesh(format!(
                "triangle {:?} is vertical",
                indices
            )));
        }
        let d = -normal.dot(a);

        let mut wall_normals = [Vec2::ZERO; 3];
        let mut wall_midpoints = [Vec3::ZERO; 3];
        for wall in 0..3 {
            let start = verts[wall];
            let end = verts[(wall + 1) % 3];
            let dx = end.x - start.x;
            let dz = end.z - start.z;
            wall_normals[wall] = Vec2::new(-dz, dx).normalize_or_zero();
            wall_midpoints[wall] = (start + end) * 0.5;
        }

        let midpoint_distances = [
            distance(&wall_midpoints[0], &wall_midpoints[1]),
            distance(&wall_midpoints[1], &wall_midpoints[2]),
            distance(&wall_midpoints[2], &wall_midpoints[0]),
        ];

        let mut bounds = Aabb::empty();
        for v in &verts {
            bounds.expand_point(v);
        }

        Ok(Self {
            indices,
            verts,
            centroid: (a + b + c) / 3.0,
            normal,
            d,
            wall_normals,
            wall_midpoints,
            midpoint_distances,
            bounds,
            links: [CellLink::NONE; 3],
        })
    }

    /// Gets the vertex buffer indices of this cell
    pub fn indices(&self) -> [u32; 3] {
        self.indices
    }

    /// Gets a vertex position
    #[inline]
    pub fn vertex(&self, index: usize) -> Vec3 {
        self.verts[index % 3]
    }

    /// Gets all three vertex positions
    pub fn vertices(&self) -> &[Vec3; 3] {
        &self.verts
    }

    pub fn centroid(&self) -> Vec3 {
        self.centroid
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn plane_d(&self) -> f32 {
        self.d
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Gets the left vertex of a wall, as seen from inside the cell looking out
    #[inline]
    pub fn wall_left_vertex(&self, wall: usize) -> Vec3 {
        self.verts[wall % 3]
    }

    /// Gets the right vertex of a wall, as seen from inside the cell looking out
    #[inline]
    pub fn wall_right_vertex(&self, wall: usize) -> Vec3 {
        self.verts[(wall + 1) % 3]
    }

    pub fn wall_midpoint(&self, wall: usize) -> Vec3 {
        self.wall_midpoints[wall % 3]
    }

    /// Gets the outward XZ normal of a wall
    pub fn wall_normal(&self, wall: usize) -> Vec2 {
        self.wall_normals[wall % 3]
    }

    /// Distance between the midpoints of two walls
    pub fn midpoint_distance(&self, wall_a: usize, wall_b: usize) -> f32 {
        let (a, b) = (wall_a % 3, wall_b % 3);
        if a == b {
            return 0.0;
        }
        match (a.min(b), a.max(b)) {
            (0, 1) => self.midpoint_distances[0],
            (1, 2) => self.midpoint_distances[1],
            _ => self.midpoint_distances[2],
        }
    }

    /// Signed XZ distance from a point to the line of a wall.
    ///
    /// Positive values lie outside the cell.
    #[inline]
    pub fn signed_wall_distance(&self, p: &Vec3, wall: usize) -> f32 {
        let n = self.wall_normals[wall % 3];
        let start = self.verts[wall % 3];
        n.x * (p.x - start.x) + n.y * (p.z - start.z)
    }

    /// Squared XZ distance from a point to a wall segment
    pub fn wall_distance_sqr(&self, p: &Vec3, wall: usize) -> f32 {
        dist_point_segment_sqr_2d(p, &self.wall_left_vertex(wall), &self.wall_right_vertex(wall))
    }

    /// Height of the cell plane at the given XZ location
    #[inline]
    pub fn plane_y(&self, x: f32, z: f32) -> f32 {
        -(self.normal.x * x + self.normal.z * z + self.d) / self.normal.y
    }

    /// Checks if a point lies within the column of this cell, edges included
    #[inline]
    pub fn is_in_column(&self, p: &Vec3) -> bool {
        if p.x < self.bounds.min.x
            || p.x > self.bounds.max.x
            || p.z < self.bounds.min.z
            || p.z > self.bounds.max.z
        {
            return false;
        }
        point_in_triangle_2d(p, &self.verts[0], &self.verts[1], &self.verts[2])
    }

    /// Classifies the directed segment `a -> b` against this cell.
    ///
    /// A point lying on a wall counts as outside of it.
    pub fn path_relationship(&self, a: &Vec3, b: &Vec3) -> PathRelationship {
        let mut b_inside = true;
        let mut b_dist = [0.0f32; 3];
        for (wall, dist) in b_dist.iter_mut().enumerate() {
            *dist = self.signed_wall_distance(b, wall);
            if *dist > -WALL_TOLERANCE {
                b_inside = false;
            }
        }
        if b_inside {
            return PathRelationship::EndingCell;
        }

        for (wall, &dist_b) in b_dist.iter().enumerate() {
            if dist_b <= -WALL_TOLERANCE {
                continue;
            }
            // Only walls crossed while moving outward can be exit walls
            if self.signed_wall_distance(a, wall) >= dist_b {
                continue;
            }
            let left = self.wall_left_vertex(wall);
            let right = self.wall_right_vertex(wall);
            if let Some((s, _)) = intersect_segments_2d(a, b, &left, &right) {
                let x = a.x + (b.x - a.x) * s;
                let z = a.z + (b.z - a.z) * s;
                return PathRelationship::ExitingCell {
                    wall,
                    point: Vec3::new(x, self.plane_y(x, z), z),
                };
            }
        }

        PathRelationship::NoRelationship
    }

    /// Gets the neighbor across a wall and the neighbor's matching wall
    #[inline]
    pub fn link(&self, wall: usize) -> Option<(CellRef, usize)> {
        let link = self.links[wall % 3];
        link.is_set()
            .then(|| (CellRef::new(link.cell), link.wall as usize))
    }

    /// Number of linked walls
    pub fn link_count(&self) -> usize {
        self.links.iter().filter(|l| l.is_set()).count()
    }

    /// Gets the wall that links this cell to `other`, if any
    pub fn wall_to(&self, other: CellRef) -> Option<usize> {
        self.links
            .iter()
            .position(|l| l.is_set() && l.cell == other.id())
    }

    /// Finds the walls shared with another cell.
    ///
    /// Shared walls run in opposite directions: this cell's wall `(a, b)`
    /// must match the other cell's wall `(b, a)`.
    pub fn shared_wall(&self, other: &TriCell) -> Option<(usize, usize)> {
        let tol_sqr = VERTEX_MATCH_TOLERANCE * VERTEX_MATCH_TOLERANCE;
        for wall in 0..3 {
            let left = self.wall_left_vertex(wall);
            let right = self.wall_right_vertex(wall);
            for other_wall in 0..3 {
                if distance_squared(&left, &other.wall_right_vertex(other_wall)) <= tol_sqr
                    && distance_squared(&right, &other.wall_left_vertex(other_wall)) <= tol_sqr
                {
                    return Some((wall, other_wall));
                }
            }
        }
        None
    }

    /// Links cell `a` to cell `b` across their shared wall.
    ///
    /// With `cross_link` both sides are set, or neither. Returns the wall index
    /// on `a`'s side, or `None` when the cells share no wall or a wall slot is
    /// already occupied.
    pub fn link_cells(cells: &mut [TriCell], a: CellRef, b: CellRef, cross_link: bool) -> Option<usize> {
        if a == b {
            return None;
        }
        let (wall_a, wall_b) = {
            let cell_a = cells.get(a.index())?;
            let cell_b = cells.get(b.index())?;
            cell_a.shared_wall(cell_b)?
        };

        if cells[a.index()].links[wall_a].is_set() {
            return None;
        }
        if cross_link && cells[b.index()].links[wall_b].is_set() {
            return None;
        }

        cells[a.index()].links[wall_a] = CellLink {
            cell: b.id(),
            wall: wall_b as u8,
        };
        if cross_link {
            cells[b.index()].links[wall_b] = CellLink {
                cell: a.id(),
                wall: wall_a as u8,
            };
        }

        Some(wall_a)
    }

    /// Selects the closest cell to a point from a candidate set.
    ///
    /// Cells whose column contains the point win, ranked by vertical distance
    /// to their plane. Unless `must_be_in_column` is set, other cells are
    /// ranked by the 3D distance to the point where a line from their centroid
    /// toward the point exits them. Returns the cell and the snapped point.
    pub fn closest_cell<I>(
        cells: &[TriCell],
        candidates: I,
        p: &Vec3,
        must_be_in_column: bool,
    ) -> Option<(CellRef, Vec3)>
    where
        I: IntoIterator<Item = CellRef>,
    {
        let mut best_column: Option<(f32, CellRef, Vec3)> = None;
        let mut best_outside: Option<(f32, CellRef, Vec3)> = None;

        for candidate in candidates {
            let Some(cell) = cells.get(candidate.index()) else {
                continue;
            };

            if cell.is_in_column(p) {
                let snapped = Vec3::new(p.x, cell.plane_y(p.x, p.z), p.z);
                let dist = distance_squared(p, &snapped);
                if best_column.map_or(true, |(d, _, _)| dist < d) {
                    best_column = Some((dist, candidate, snapped));
                }
            } else if !must_be_in_column && best_column.is_none() {
                let exit = cell.exit_point_toward(p);
                let dist = distance_squared(p, &exit);
                if best_outside.map_or(true, |(d, _, _)| dist < d) {
                    best_outside = Some((dist, candidate, exit));
                }
            }
        }

        best_column
            .or(best_outside)
            .map(|(_, cell, point)| (cell, point))
    }

    /// Point where the line from the centroid toward `p` leaves the cell
    fn exit_point_toward(&self, p: &Vec3) -> Vec3 {
        if let PathRelationship::ExitingCell { point, .. } = self.path_relationship(&self.centroid, p) {
            return point;
        }

        // Point sits on the boundary: use the nearest wall point instead
        let mut best = self.verts[0];
        let mut best_dist = f32::MAX;
        for wall in 0..3 {
            let q = closest_point_on_segment_2d(p, &self.wall_left_vertex(wall), &self.wall_right_vertex(wall));
            let dist = distance_squared(p, &q);
            if dist < best_dist {
                best_dist = dist;
                best = q;
            }
        }
        best
    }
}
