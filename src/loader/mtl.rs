//! MTL material library parser
//!
//! Recognizes `newmtl`, `map_Kd` (diffuse), `map_Ks` (specular) and `norm`
//! (normal map). Map paths are relative to the library's directory. Every
//! other record is ignored.

use std::fs;
use std::path::Path;

use super::image::ImageDecoder;
use crate::error::{ParseError, ParseErrorKind, ResourceError};
use crate::scene::{Material, MaterialSampler};

/// Read the library at `path`. A missing or unreadable file is reported
/// through `resource_errors` and yields no materials.
pub fn load_materials(
    path: &Path,
    decoder: &dyn ImageDecoder,
    resource_errors: &mut Vec<ResourceError>,
) -> Result<Vec<Material>, ParseError> {
    match fs::read_to_string(path) {
        Ok(source) => parse_materials(&source, path, decoder, resource_errors),
        Err(e) => {
            let err = if e.kind() == std::io::ErrorKind::NotFound {
                ResourceError::NotFound { path: path.to_path_buf() }
            } else {
                ResourceError::Decode { path: path.to_path_buf(), message: e.to_string() }
            };
            log::warn!("{}", err);
            resource_errors.push(err);
            Ok(Vec::new())
        }
    }
}

/// Parse library text; `path` names the file for errors and anchors map paths
pub fn parse_materials(
    source: &str,
    path: &Path,
    decoder: &dyn ImageDecoder,
    resource_errors: &mut Vec<ResourceError>,
) -> Result<Vec<Material>, ParseError> {
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let mut materials: Vec<Material> = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let fail = |kind| ParseError { path: path.to_path_buf(), line, kind };

        let mut tokens = raw.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        let rest: Vec<&str> = tokens.collect();

        match keyword {
            "newmtl" => {
                let name = rest.join(" ");
                if name.is_empty() {
                    return Err(fail(ParseErrorKind::MissingMaterialName));
                }
                materials.push(Material::new(name));
            }
            "map_Kd" | "map_Ks" | "norm" => {
                let Some(material) = materials.last_mut() else {
                    return Err(fail(ParseErrorKind::MissingMaterialName));
                };
                let (slot, record) = match keyword {
                    "map_Kd" => (&mut material.diffuse, "map_Kd"),
                    "map_Ks" => (&mut material.specular, "map_Ks"),
                    _ => (&mut material.normal, "norm"),
                };
                let file = rest.join(" ");
                if file.is_empty() {
                    return Err(fail(ParseErrorKind::MissingValue(record)));
                }
                *slot = decode_map(&dir.join(file), decoder, resource_errors);
            }
            _ => {}
        }
    }

    Ok(materials)
}

fn decode_map(
    path: &Path,
    decoder: &dyn ImageDecoder,
    resource_errors: &mut Vec<ResourceError>,
) -> Option<MaterialSampler> {
    match decoder.decode(path) {
        Ok(sampler) => Some(sampler),
        Err(err) => {
            log::warn!("{}", err);
            resource_errors.push(err);
            None
        }
    }
}
