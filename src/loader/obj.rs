//! Wavefront OBJ mesh parser
//!
//! Recognizes `v`, `vt`, `vn`, `f`, `mtllib` and `usemtl`; anything else is
//! skipped. Faces with more than three corners are triangulated as they are
//! read. Corners without a normal get one synthesized once the whole file
//! is in.

use std::fs;
use std::path::{Path, PathBuf};

use super::image::{FileDecoder, ImageDecoder};
use super::mtl::load_materials;
use crate::error::{LoadError, ParseError, ParseErrorKind, ResourceError};
use crate::rasterizer::{Vec3, Vec4};
use crate::scene::{triangulate, Material, Mesh, Normal, Polygon, Position, Vertex};

/// A parsed mesh plus the resources that could not be loaded for it
#[derive(Debug)]
pub struct LoadedMesh {
    pub mesh: Mesh,
    pub resource_errors: Vec<ResourceError>,
}

/// Load an OBJ file, decoding texture maps with the `image` crate
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<LoadedMesh, LoadError> {
    load_obj_with(path, &FileDecoder)
}

pub fn load_obj_with<P: AsRef<Path>>(
    path: P,
    decoder: &dyn ImageDecoder,
) -> Result<LoadedMesh, LoadError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_obj(&source, path, decoder)?)
}

/// Parse OBJ text. `path` names the file in errors and anchors `mtllib`.
pub fn parse_obj(
    source: &str,
    path: &Path,
    decoder: &dyn ImageDecoder,
) -> Result<LoadedMesh, ParseError> {
    let mut parser = ObjParser::new(path, decoder);
    let mut last_line = 0;
    for (index, raw) in source.lines().enumerate() {
        last_line = index + 1;
        parser.record(raw).map_err(|e| e.at(path, last_line))?;
    }
    parser.finish().map_err(|kind| ParseError { path: path.to_path_buf(), line: last_line, kind })
}

/// A failed record: either this file's own syntax or a material library's
enum RecordError {
    Syntax(ParseErrorKind),
    Library(ParseError),
}

impl RecordError {
    fn at(self, path: &Path, line: usize) -> ParseError {
        match self {
            RecordError::Syntax(kind) => ParseError { path: path.to_path_buf(), line, kind },
            RecordError::Library(err) => err,
        }
    }
}

impl From<ParseErrorKind> for RecordError {
    fn from(kind: ParseErrorKind) -> Self {
        RecordError::Syntax(kind)
    }
}

struct ObjParser<'a> {
    dir: PathBuf,
    decoder: &'a dyn ImageDecoder,
    positions: Vec<Position>,
    normals: Vec<Normal>,
    uvs: Vec<Vec3>,
    polygons: Vec<Polygon>,
    materials: Vec<Material>,
    current_material: Option<usize>,
    resource_errors: Vec<ResourceError>,
}

impl<'a> ObjParser<'a> {
    fn new(path: &Path, decoder: &'a dyn ImageDecoder) -> Self {
        Self {
            dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            decoder,
            positions: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            polygons: Vec::new(),
            materials: Vec::new(),
            current_material: None,
            resource_errors: Vec::new(),
        }
    }

    fn record(&mut self, raw: &str) -> Result<(), RecordError> {
        let mut tokens = raw.split_whitespace();
        let Some(keyword) = tokens.next() else {
            return Ok(());
        };
        let args: Vec<&str> = tokens.collect();

        match keyword {
            "v" => {
                let v = parse_floats(&args, 4)?;
                if v.len() < 3 {
                    return Err(ParseErrorKind::MissingValue("v").into());
                }
                let w = v.get(3).copied().unwrap_or(1.0);
                self.positions.push(Position::new(Vec4::new(v[0], v[1], v[2], w)));
            }
            "vt" => {
                let v = parse_floats(&args, 3)?;
                if v.is_empty() {
                    return Err(ParseErrorKind::MissingValue("vt").into());
                }
                let at = |i: usize| v.get(i).copied().unwrap_or(0.0);
                self.uvs.push(Vec3::new(at(0), at(1), at(2)));
            }
            "vn" => {
                let v = parse_floats(&args, 3)?;
                if v.len() < 3 {
                    return Err(ParseErrorKind::MissingValue("vn").into());
                }
                self.normals.push(Normal::new(Vec3::new(v[0], v[1], v[2]).normalize()));
            }
            "f" => self.face(&args)?,
            "mtllib" => {
                if args.is_empty() {
                    return Err(ParseErrorKind::MissingValue("mtllib").into());
                }
                for file in args {
                    let lib = self.dir.join(file);
                    let materials = load_materials(&lib, self.decoder, &mut self.resource_errors)
                        .map_err(RecordError::Library)?;
                    self.materials.extend(materials);
                }
            }
            "usemtl" => {
                let name = args.join(" ");
                if name.is_empty() {
                    return Err(ParseErrorKind::MissingValue("usemtl").into());
                }
                self.current_material = self.materials.iter().position(|m| m.name == name);
                if self.current_material.is_none() {
                    let err = ResourceError::UnknownMaterial { name };
                    log::warn!("{}", err);
                    self.resource_errors.push(err);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn face(&mut self, args: &[&str]) -> Result<(), ParseErrorKind> {
        let mut vertices = Vec::with_capacity(args.len());
        for reference in args {
            let mut parts = reference.split('/');
            let position = match parts.next() {
                Some(p) if !p.is_empty() => resolve(p, self.positions.len(), "positions")?,
                _ => return Err(ParseErrorKind::MissingValue("f")),
            };
            let uv = match parts.next() {
                Some(t) if !t.is_empty() => Some(resolve(t, self.uvs.len(), "texture coordinates")?),
                _ => None,
            };
            let normal = match parts.next() {
                Some(n) if !n.is_empty() => Some(resolve(n, self.normals.len(), "normals")?),
                _ => None,
            };
            vertices.push(Vertex {
                position,
                normal,
                uv: uv.map(|i| self.uvs[i]).unwrap_or(Vec3::ZERO),
            });
        }

        let polygon = Polygon::new(vertices, self.current_material)?;
        self.polygons.extend(triangulate(polygon, &self.positions));
        Ok(())
    }

    fn finish(self) -> Result<LoadedMesh, ParseErrorKind> {
        if self.positions.is_empty() || self.polygons.is_empty() {
            return Err(ParseErrorKind::EmptyModel);
        }
        let mut mesh = Mesh::new(self.positions, self.normals, self.polygons, self.materials);
        mesh.synthesize_normals();
        log::info!(
            "Loaded mesh: {} positions, {} normals, {} polygons, {} materials",
            mesh.positions.len(),
            mesh.normals.len(),
            mesh.polygons.len(),
            mesh.materials.len()
        );
        Ok(LoadedMesh { mesh, resource_errors: self.resource_errors })
    }
}

/// Parse up to `max` floats
fn parse_floats(args: &[&str], max: usize) -> Result<Vec<f32>, ParseErrorKind> {
    args.iter()
        .take(max)
        .map(|t| t.parse::<f32>().map_err(|_| ParseErrorKind::InvalidNumber(t.to_string())))
        .collect()
}

/// 1-based index, or negative counting back from the end of what was read
fn resolve(token: &str, count: usize, what: &'static str) -> Result<usize, ParseErrorKind> {
    let index: i64 = token
        .parse()
        .map_err(|_| ParseErrorKind::InvalidNumber(token.to_string()))?;
    let resolved = if index > 0 { index - 1 } else { count as i64 + index };
    if index == 0 || resolved < 0 || resolved >= count as i64 {
        return Err(ParseErrorKind::IndexOutOfRange { what, index, count });
    }
    Ok(resolved as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PolygonError;
    use crate::scene::MaterialSampler;
    use approx::assert_relative_eq;

    struct NoImages;

    impl ImageDecoder for NoImages {
        fn decode(&self, path: &Path) -> Result<MaterialSampler, ResourceError> {
            Err(ResourceError::NotFound { path: path.to_path_buf() })
        }
    }

    fn parse(source: &str) -> Result<LoadedMesh, ParseError> {
        parse_obj(source, Path::new("test.obj"), &NoImages)
    }

    #[test]
    fn test_single_triangle() {
        let loaded = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        let mesh = loaded.mesh;
        assert_eq!(mesh.positions.len(), 3);
        assert_eq!(mesh.polygons.len(), 1);
        let ids: Vec<usize> = mesh.polygons[0].vertices().iter().map(|v| v.position).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(loaded.resource_errors.is_empty());
    }

    #[test]
    fn test_quad_is_triangulated() {
        let loaded = parse("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n").unwrap();
        let polygons = &loaded.mesh.polygons;
        assert_eq!(polygons.len(), 2);
        assert!(polygons.iter().all(|p| p.len() == 3));
        let a: Vec<usize> = polygons[0].vertices().iter().map(|v| v.position).collect();
        let shared = polygons[1]
            .vertices()
            .iter()
            .filter(|v| a.contains(&v.position))
            .count();
        assert_eq!(shared, 2);
    }

    #[test]
    fn test_two_index_face_rejected() {
        let err = parse("v 0 0 0\nv 1 0 0\nf 1 2\n").unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(err.kind, ParseErrorKind::Polygon(PolygonError::TooFewVertices(2)));
        assert!(err.to_string().contains("vertices count less than 3"));
    }

    #[test]
    fn test_full_references_and_negative_indices() {
        let source = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0 1
vn 0 0 2
f -3/1/1 -2/2/1 -1/3/1
";
        let mesh = parse(source).unwrap().mesh;
        let v = mesh.polygons[0].vertices();
        assert_eq!(v[0].position, 0);
        assert_eq!(v[2].position, 2);
        assert_eq!(v[1].uv, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(v[2].normal, Some(0));
        // Normalized on read, and nothing synthesized
        assert_relative_eq!(mesh.normals[0].original.z, 1.0);
        assert_eq!(mesh.normals.len(), 1);
    }

    #[test]
    fn test_position_only_and_normal_only_refs() {
        let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3\n";
        let mesh = parse(source).unwrap().mesh;
        let v = mesh.polygons[0].vertices();
        assert_eq!(v[0].normal, Some(0));
        assert_eq!(v[0].uv, Vec3::ZERO);
        // Third corner got a synthesized normal
        assert_eq!(v[2].normal, Some(1));
    }

    #[test]
    fn test_four_component_position() {
        let mesh = parse("v 1 2 3 0.5\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap().mesh;
        assert_eq!(mesh.positions[0].original, Vec4::new(1.0, 2.0, 3.0, 0.5));
    }

    #[test]
    fn test_bad_input_reports_line() {
        let err = parse("v 0 0 0\nv 1 x 0\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.kind, ParseErrorKind::InvalidNumber("x".into()));

        let err = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::IndexOutOfRange { index: 4, count: 3, .. }));

        let err = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::IndexOutOfRange { index: 0, .. }));

        let err = parse("v 0 0\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingValue("v"));
    }

    #[test]
    fn test_empty_model() {
        let err = parse("# nothing here\nv 0 0 0\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::EmptyModel);
        assert!(parse("").is_err());
    }

    #[test]
    fn test_unknown_material_is_not_fatal() {
        let loaded = parse("usemtl ghost\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        assert_eq!(
            loaded.resource_errors,
            vec![ResourceError::UnknownMaterial { name: "ghost".into() }]
        );
        assert_eq!(loaded.mesh.polygons[0].material, None);
    }

    #[test]
    fn test_mtllib_loads_every_library() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.mtl"), "newmtl first\n").unwrap();
        fs::write(dir.path().join("b.mtl"), "newmtl second\n").unwrap();
        let source = "mtllib a.mtl b.mtl c.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl second\nf 1 2 3\n";

        let loaded = parse_obj(source, &dir.path().join("test.obj"), &NoImages).unwrap();
        let names: Vec<&str> = loaded.mesh.materials.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(loaded.mesh.polygons[0].material, Some(1));
        assert_eq!(
            loaded.resource_errors,
            vec![ResourceError::NotFound { path: dir.path().join("c.mtl") }]
        );
    }

    #[test]
    fn test_unrecognized_records_ignored() {
        let source = "o thing\ng group\ns off\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\nl 1 2\n";
        assert_eq!(parse(source).unwrap().mesh.polygons.len(), 1);
    }
}
