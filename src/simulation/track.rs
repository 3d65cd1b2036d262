//! Track geometry: the triangle mesh handed over by the map collaborator,
//! and the surface triangles and boundary segments derived from it.

use std::collections::HashMap;
use std::f32::consts::TAU;

use geo::{Triangle, coord};

use super::error::{MapError, Result};
use super::geometry::{LineSegment, Point2, TrackTriangle};

/// Indexed triangle mesh of the drivable area.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMesh {
    /// Vertex positions.
    pub vertices: Vec<Point2>,
    /// Triangles as 0-based vertex indices.
    pub faces: Vec<[usize; 3]>,
}

/// Static geometry the spatial indices are built from.
#[derive(Debug, Clone)]
pub struct Track {
    /// Drivable triangles.
    pub surface: Vec<TrackTriangle>,
    /// Edges belonging to exactly one triangle.
    pub borders: Vec<LineSegment>,
}

impl TrackMesh {
    /// Checks every face index against the vertex list.
    pub fn validate(&self) -> Result<(), MapError> {
        if self.faces.is_empty() {
            return Err(MapError::Empty);
        }
        for (face, indices) in self.faces.iter().enumerate() {
            if let Some(&vertex) = indices.iter().find(|&&i| i >= self.vertices.len()) {
                return Err(MapError::VertexOutOfRange {
                    face,
                    vertex,
                    count: self.vertices.len(),
                });
            }
        }
        Ok(())
    }

    /// One triangle per face. Fails on a mesh that does not validate.
    pub fn triangles(&self) -> Result<Vec<TrackTriangle>, MapError> {
        self.validate()?;
        Ok(self.triangles_unchecked())
    }

    /// Edges that occur in exactly one face, i.e. an odd number of times
    /// when every face contributes its three edges as unordered index pairs.
    /// Returned in face order. Fails on a mesh that does not validate.
    pub fn boundary(&self) -> Result<Vec<LineSegment>, MapError> {
        self.validate()?;
        Ok(self.boundary_unchecked())
    }

    /// Validates the mesh and derives surface and boundary geometry.
    pub fn to_track(&self) -> Result<Track, MapError> {
        self.validate()?;
        Ok(Track {
            surface: self.triangles_unchecked(),
            borders: self.boundary_unchecked(),
        })
    }

    fn triangles_unchecked(&self) -> Vec<TrackTriangle> {
        self.faces
            .iter()
            .map(|&[a, b, c]| Triangle::new(self.vertices[a], self.vertices[b], self.vertices[c]))
            .collect()
    }

    fn boundary_unchecked(&self) -> Vec<LineSegment> {
        let edges: Vec<(usize, usize)> = self
            .faces
            .iter()
            .flat_map(|&[a, b, c]| [(a, b), (c, b), (a, c)])
            .collect();

        let mut multiplicity: HashMap<(usize, usize), usize> = HashMap::new();
        for &(a, b) in &edges {
            *multiplicity.entry((a.min(b), a.max(b))).or_default() += 1;
        }

        edges
            .into_iter()
            .filter(|&(a, b)| multiplicity[&(a.min(b), a.max(b))] % 2 == 1)
            .map(|(a, b)| LineSegment::new(self.vertices[a], self.vertices[b]))
            .collect()
    }

    /// Parses a Wavefront-style mesh.
    ///
    /// `v x y z` lines become vertices using the x and z coordinates scaled
    /// by `scale` (the mesh is authored lying on the ground plane); `f a b c`
    /// lines become faces with 1-based indices, ignoring anything after a
    /// `/`. Other lines are skipped.
    pub fn parse_obj(text: &str, scale: f32) -> Result<Self, MapError> {
        let mut mesh = Self::default();

        for (number, raw) in text.lines().enumerate() {
            let line = number + 1;
            let mut fields = raw.split_whitespace();
            match fields.next() {
                Some("v") => {
                    let values = fields
                        .map(|f| parse_field::<f32>(f, line))
                        .collect::<Result<Vec<_>, _>>()?;
                    let [x, _, z, ..] = values[..] else {
                        return Err(MapError::Parse {
                            line,
                            reason: format!("vertex needs 3 coordinates, got {}", values.len()),
                        });
                    };
                    mesh.vertices.push(coord! { x: x * scale, y: z * scale });
                }
                Some("f") => {
                    let indices = fields
                        .map(|f| {
                            let index = parse_field::<usize>(f.split('/').next().unwrap_or(f), line)?;
                            index.checked_sub(1).ok_or_else(|| MapError::Parse {
                                line,
                                reason: "face indices are 1-based".to_owned(),
                            })
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    let [a, b, c] = indices[..] else {
                        return Err(MapError::Parse {
                            line,
                            reason: format!("only triangles are supported, got {} indices", indices.len()),
                        });
                    };
                    mesh.faces.push([a, b, c]);
                }
                _ => {}
            }
        }

        mesh.validate()?;
        Ok(mesh)
    }

    /// An annulus centred on the origin split into `segments` quads of two
    /// triangles each.
    pub fn ring(inner_radius: f32, outer_radius: f32, segments: usize) -> Self {
        let mut mesh = Self::default();

        for i in 0..segments {
            let angle = TAU * i as f32 / segments as f32;
            let (sin, cos) = angle.sin_cos();
            mesh.vertices.push(coord! { x: cos * inner_radius, y: sin * inner_radius });
            mesh.vertices.push(coord! { x: cos * outer_radius, y: sin * outer_radius });
        }

        for i in 0..segments {
            let (inner, outer) = (2 * i, 2 * i + 1);
            let (next_inner, next_outer) = (2 * ((i + 1) % segments), 2 * ((i + 1) % segments) + 1);
            mesh.faces.push([inner, outer, next_outer]);
            mesh.faces.push([inner, next_outer, next_inner]);
        }

        mesh
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, line: usize) -> Result<T, MapError> {
    field.parse().map_err(|_| MapError::Parse {
        line,
        reason: format!("cannot parse {field:?}"),
    })
}
