//! Ear-heuristic polygon triangulation
//!
//! Each round scores every candidate ear by how round it is (triangle area
//! over circumscribed-circle area), clips the best one and drops its tip.
//! Convexity and self-intersection are not checked.

use std::f64::consts::PI;

use super::mesh::{Polygon, Position, Vertex};

const DEGENERATE_AREA: f64 = 1e-12;

/// Area-to-circumcircle ratio of triangle (a, b, c); 0 for slivers
fn roundness(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> f64 {
    let sub = |p: [f64; 3], q: [f64; 3]| [p[0] - q[0], p[1] - q[1], p[2] - q[2]];
    let len = |v: [f64; 3]| (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();

    let ba = sub(b, a);
    let cb = sub(c, b);
    let ac = sub(a, c);
    let cross = [
        ba[1] * cb[2] - ba[2] * cb[1],
        ba[2] * cb[0] - ba[0] * cb[2],
        ba[0] * cb[1] - ba[1] * cb[0],
    ];
    let area = len(cross) / 2.0;
    if area <= DEGENERATE_AREA {
        return 0.0;
    }
    let radius = len(ba) * len(cb) * len(ac) / (4.0 * area);
    area / (PI * radius * radius)
}

/// Split `polygon` into `n - 2` triangles sharing its material.
///
/// Triangles come back as (tip, next, previous), which keeps the winding
/// of the source polygon. A triangle is returned unchanged.
pub fn triangulate(polygon: Polygon, positions: &[Position]) -> Vec<Polygon> {
    if polygon.len() == 3 {
        return vec![polygon];
    }

    let material = polygon.material;
    let point = |v: &Vertex| {
        let p = positions[v.position].original;
        [p.x as f64, p.y as f64, p.z as f64]
    };

    let mut working: Vec<Vertex> = polygon.vertices().to_vec();
    let mut triangles = Vec::with_capacity(working.len() - 2);

    while working.len() >= 3 {
        let n = working.len();
        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for i in 0..n {
            let score = roundness(
                point(&working[i]),
                point(&working[(i + 1) % n]),
                point(&working[(i + n - 1) % n]),
            );
            // Strict comparison keeps the first maximum
            if score > best_score {
                best_score = score;
                best = i;
            }
        }

        let ear = vec![working[best], working[(best + 1) % n], working[(best + n - 1) % n]];
        if let Ok(triangle) = Polygon::new(ear, material) {
            triangles.push(triangle);
        }
        working.remove(best);
    }

    triangles
}
