//! Renderable mesh for a tile's height field.
//!
//! The mesh is centered on the tile origin in x and z, so a tile at index `i`
//! covers `[(i - 0.5) * L, (i + 0.5) * L]` along the road and its seams line
//! up with the window's shift boundaries.

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;

use crate::height_field::HeightField;

/// Build a triangle-list mesh with positions, normals and UVs.
pub fn build_tile_mesh(field: &HeightField) -> Mesh {
    let res = field.resolution();
    let size = field.size();
    let (dx, dz) = field.sample_spacing();
    let half_x = size.x * 0.5;
    let half_z = size.z * 0.5;
    let uv_step = 1.0 / (res.max(2) - 1) as f32;

    let sample = |x: usize, y: usize| field.get(x, y).unwrap_or(0.0) * size.y;

    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(res * res);
    let mut normals: Vec<[f32; 3]> = Vec::with_capacity(res * res);
    let mut uvs: Vec<[f32; 2]> = Vec::with_capacity(res * res);

    for y in 0..res {
        for x in 0..res {
            positions.push([
                x as f32 * dx - half_x,
                sample(x, y),
                y as f32 * dz - half_z,
            ]);

            // Central differences, one-sided on the border
            let (x0, x1) = (x.saturating_sub(1), (x + 1).min(res - 1));
            let (y0, y1) = (y.saturating_sub(1), (y + 1).min(res - 1));
            let slope_x = (sample(x1, y) - sample(x0, y)) / ((x1 - x0).max(1) as f32 * dx);
            let slope_z = (sample(x, y1) - sample(x, y0)) / ((y1 - y0).max(1) as f32 * dz);
            let normal = Vec3::new(-slope_x, 1.0, -slope_z).normalize();
            normals.push(normal.to_array());

            uvs.push([x as f32 * uv_step, y as f32 * uv_step]);
        }
    }

    let mut indices: Vec<u32> = Vec::with_capacity(res.saturating_sub(1).pow(2) * 6);
    for y in 0..res.saturating_sub(1) {
        for x in 0..res.saturating_sub(1) {
            let i = (y * res + x) as u32;
            let right = i + 1;
            let up = i + res as u32;
            let up_right = up + 1;
            // Counter-clockwise seen from above (+y)
            indices.extend_from_slice(&[i, up, right, right, up, up_right]);
        }
    }

    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
        .with_inserted_indices(Indices::U32(indices))
}
