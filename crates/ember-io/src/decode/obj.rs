// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::{AssetDecoder, DecodeError};
use ember_core::renderer::{CpuMesh, Vertex};

/// Parses Wavefront OBJ text into a single triangulated [`CpuMesh`].
///
/// Every model in the file is appended to the same mesh. Material libraries
/// are ignored. Missing normals or texture coordinates are left at zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjMeshDecoder;

impl AssetDecoder<CpuMesh> for ObjMeshDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<CpuMesh, DecodeError> {
        let (models, _materials) = tobj::load_obj_buf(
            &mut std::io::Cursor::new(bytes),
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
            |_| Ok((Vec::new(), Default::default())),
        )?;

        let mut mesh = CpuMesh::default();
        for model in &models {
            let source = &model.mesh;
            let base = mesh.vertices.len() as u32;
            let vertex_count = source.positions.len() / 3;

            mesh.vertices.extend((0..vertex_count).map(|i| Vertex {
                position: [
                    source.positions[3 * i],
                    source.positions[3 * i + 1],
                    source.positions[3 * i + 2],
                ],
                normal: source
                    .normals
                    .get(3 * i..3 * i + 3)
                    .map_or([0.0; 3], |n| [n[0], n[1], n[2]]),
                uv: source
                    .texcoords
                    .get(2 * i..2 * i + 2)
                    .map_or([0.0; 2], |t| [t[0], t[1]]),
            }));
            mesh.indices.extend(source.indices.iter().map(|&index| base + index));
        }

        if mesh.is_empty() {
            return Err(DecodeError::Empty(format!(
                "OBJ with {} model(s) and no triangles",
                models.len()
            )));
        }
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
o quad
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn quad_is_triangulated_with_attributes() {
        let mesh = ObjMeshDecoder.decode(QUAD.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertices.len(), 4);
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
        assert!(mesh.vertices.iter().any(|v| v.uv == [1.0, 1.0]));
    }

    #[test]
    fn models_are_concatenated() {
        let text = "\
o a
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
o b
v 0 0 1
v 1 0 1
v 0 1 1
f 4 5 6
";
        let mesh = ObjMeshDecoder.decode(text.as_bytes()).unwrap();
        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
        assert!(mesh.vertices.iter().all(|v| v.uv == [0.0, 0.0]));
    }

    #[test]
    fn file_without_faces_is_empty() {
        let error = ObjMeshDecoder.decode(b"v 0 0 0\n").unwrap_err();
        assert!(matches!(error, DecodeError::Empty(_)));
    }
}
