//! Core mesh data types.
//!
//! The mesh is owned by the host application. The handle core reads vertex
//! positions and faces, and only the deformation solver writes positions back.

use nalgebra::Point3;

use crate::error::{HandleError, HandleResult};

/// A mesh vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    /// 3D position.
    pub position: Point3<f64>,
}

impl Vertex {
    /// Create a new vertex.
    #[inline]
    pub fn new(position: Point3<f64>) -> Self {
        Self { position }
    }

    /// Create a vertex from raw coordinates.
    #[inline]
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }
}

/// A triangle mesh with indexed vertices and faces.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Vertex data. The index of a vertex is its id for the whole session.
    pub vertices: Vec<Vertex>,

    /// Triangle faces as indices into the vertex array.
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from raw positions and faces, checking face indices.
    pub fn from_parts(
        positions: impl IntoIterator<Item = Point3<f64>>,
        faces: Vec<[u32; 3]>,
    ) -> HandleResult<Self> {
        let mesh = Self {
            vertices: positions.into_iter().map(Vertex::new).collect(),
            faces,
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Number of vertices in the mesh.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces (triangles) in the mesh.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if mesh has no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Position of a vertex, if it exists.
    #[inline]
    pub fn position(&self, index: u32) -> Option<&Point3<f64>> {
        self.vertices.get(index as usize).map(|v| &v.position)
    }

    /// Check that every face references an existing vertex.
    pub fn validate(&self) -> HandleResult<()> {
        let vertex_count = self.vertices.len();
        for (face_index, face) in self.faces.iter().enumerate() {
            if let Some(&bad) = face.iter().find(|&&vi| vi as usize >= vertex_count) {
                return Err(HandleError::InvalidFaceVertex {
                    face_index,
                    vertex_index: bad,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    /// Compute the axis-aligned bounding box.
    /// Returns (min_corner, max_corner) or None if mesh is empty.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?.position;
        let (min, max) = self.vertices[1..]
            .iter()
            .fold((first, first), |(min, max), v| {
                (min.inf(&v.position), max.sup(&v.position))
            });
        Some((min, max))
    }

    /// Get a specific triangle by face index.
    pub fn triangle(&self, face_idx: usize) -> Option<Triangle> {
        self.faces.get(face_idx).map(|&[i0, i1, i2]| Triangle {
            v0: self.vertices[i0 as usize].position,
            v1: self.vertices[i1 as usize].position,
            v2: self.vertices[i2 as usize].position,
        })
    }
}

/// A triangle with concrete vertex positions.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub v0: Point3<f64>,
    pub v1: Point3<f64>,
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Create a new triangle from three points.
    #[inline]
    pub fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }
}
