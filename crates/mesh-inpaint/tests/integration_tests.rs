//! End-to-end integration tests for mesh-inpaint.
//!
//! These tests run the whole pipeline, from load through extraction,
//! welding, fairing and decimation to save, on small hand-built meshes.

use approx::assert_relative_eq;
use mesh_inpaint::{
    ErrorCode, InpaintParams, Mesh, MeshError, Vertex, inpaint_file, inpaint_mesh, report_mesh,
};
use std::io::Write;
use tempfile::NamedTempFile;

/// Create a simple valid cube mesh for testing.
fn create_test_cube(size: f64) -> Mesh {
    let mut mesh = Mesh::new();

    mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0)); // 0
    mesh.vertices.push(Vertex::from_coords(size, 0.0, 0.0)); // 1
    mesh.vertices.push(Vertex::from_coords(size, size, 0.0)); // 2
    mesh.vertices.push(Vertex::from_coords(0.0, size, 0.0)); // 3
    mesh.vertices.push(Vertex::from_coords(0.0, 0.0, size)); // 4
    mesh.vertices.push(Vertex::from_coords(size, 0.0, size)); // 5
    mesh.vertices.push(Vertex::from_coords(size, size, size)); // 6
    mesh.vertices.push(Vertex::from_coords(0.0, size, size)); // 7

    // 12 triangles (2 per face), CCW winding when viewed from outside
    // Bottom face (z=0)
    mesh.faces.push([0, 2, 1]);
    mesh.faces.push([0, 3, 2]);
    // Front face (y=0)
    mesh.faces.push([0, 1, 5]);
    mesh.faces.push([0, 5, 4]);
    // Back face (y=size)
    mesh.faces.push([3, 7, 6]);
    mesh.faces.push([3, 6, 2]);
    // Left face (x=0)
    mesh.faces.push([0, 4, 7]);
    mesh.faces.push([0, 7, 3]);
    // Right face (x=size)
    mesh.faces.push([1, 2, 6]);
    mesh.faces.push([1, 6, 5]);
    // Top face (z=size)
    mesh.faces.push([4, 5, 6]);
    mesh.faces.push([4, 6, 7]);

    mesh
}

/// Create a cube with its top removed (a single square hole).
fn create_open_cube(size: f64) -> Mesh {
    let mut mesh = create_test_cube(size);
    mesh.faces.pop();
    mesh.faces.pop();
    mesh
}

/// Remove the first top-face triangle lying entirely within `radius` of the
/// top face's center, leaving a triangular hole.
fn punch_triangle_near_top_center(mesh: &mut Mesh, size: f64, radius: f64) -> [u32; 3] {
    let center = size / 2.0;
    let index = mesh
        .faces
        .iter()
        .position(|face| {
            face.iter().all(|&v| {
                let p = mesh.vertices[v as usize].position;
                p.z == size && (p.x - center).abs() <= radius && (p.y - center).abs() <= radius
            })
        })
        .expect("a triangle near the top center");
    mesh.faces.remove(index)
}

#[test]
fn test_closed_cube_has_no_hole() {
    let mesh = create_test_cube(10.0);
    let err = inpaint_mesh(&mesh, &InpaintParams::default()).unwrap_err();

    assert!(matches!(err, MeshError::NoHole { boundary_loops: 0 }));
    assert_eq!(err.code(), ErrorCode::NoHole);
}

#[test]
fn test_flat_square_has_no_hole() {
    // One open edge loop around the whole sheet: nothing to fill.
    let mesh = Mesh::from_positions(
        &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        &[[0, 1, 2], [0, 2, 3]],
    );
    let err = inpaint_mesh(&mesh, &InpaintParams::default()).unwrap_err();
    assert!(matches!(err, MeshError::NoHole { boundary_loops: 1 }));
}

#[test]
fn test_open_cube_end_to_end() {
    let mesh = create_open_cube(10.0);

    for level in 0..=2 {
        let params = InpaintParams::default().with_upsample_level(level);
        let result = inpaint_mesh(&mesh, &params).unwrap();
        let scale = 4usize.pow(level as u32);

        assert_eq!(result.stats.loop_len, 4);
        assert_eq!(result.stats.upsampled_faces, 10 * scale);
        assert_eq!(result.stats.patch_faces, 4 * scale);
        assert_eq!(result.mesh.face_count(), 14 * scale);

        let report = report_mesh(&result.mesh);
        assert!(report.is_closed_surface(), "level {}: {}", level, report);
        let (min, max) = report.bounds.unwrap();
        assert_relative_eq!(min.z, 0.0);
        if level == 0 {
            // Every vertex of the rim belongs to the patch, so only the
            // bottom is held and the cap settles into its plane.
            assert!(max.z.abs() < 1e-9);
        } else {
            assert!(report.signed_volume > 0.0);
        }
    }
}

#[test]
fn test_open_cube_with_face_budget() {
    let mesh = create_open_cube(10.0);
    let params = InpaintParams::quality()
        .with_upsample_level(2)
        .with_target_faces(120);
    let result = inpaint_mesh(&mesh, &params).unwrap();

    assert_eq!(result.stats.faces_before_decimation, 224);
    assert!(result.stats.final_faces <= 120);
    assert!(report_mesh(&result.mesh).is_closed_surface());
}

#[test]
fn test_triangular_hole_in_flat_region_is_restored() {
    let size = 1.0;
    let mut closed = create_test_cube(size).upsample(3);
    let original_faces = closed.face_count();
    let removed = punch_triangle_near_top_center(&mut closed, size, 0.13);
    let mesh = closed;

    let params = InpaintParams::default().with_target_faces(original_faces);
    let result = inpaint_mesh(&mesh, &params).unwrap();

    // One new face, no new vertices.
    assert_eq!(result.stats.loop_len, 3);
    assert_eq!(result.stats.patch_faces, 1);
    assert_eq!(result.stats.welded_vertices, 3);
    assert_eq!(result.mesh.face_count(), original_faces);
    assert_eq!(result.mesh.vertex_count(), mesh.vertex_count());
    assert_eq!(result.stats.collapses_performed, 0);
    assert!(report_mesh(&result.mesh).is_closed_surface());

    // The surrounding top face is flat, so fairing leaves every vertex in place.
    assert!(result.stats.max_displacement < 1e-9);
    for v in &result.mesh.vertices {
        let matched = mesh
            .vertices
            .iter()
            .any(|o| (o.position - v.position).norm() < 1e-9);
        assert!(matched, "vertex {:?} moved", v.position);
    }

    // The filling face faces up, like the one that was removed.
    // Patch faces come first in the fused mesh.
    let patch_face = result.mesh.faces[0];
    let tri = mesh_inpaint::Triangle::new(
        result.mesh.vertices[patch_face[0] as usize].position,
        result.mesh.vertices[patch_face[1] as usize].position,
        result.mesh.vertices[patch_face[2] as usize].position,
    );
    assert!(tri.normal().unwrap().z > 0.99);
    let removed_normal = mesh_inpaint::Triangle::new(
        mesh.position(removed[0]),
        mesh.position(removed[1]),
        mesh.position(removed[2]),
    )
    .normal()
    .unwrap();
    assert_relative_eq!(removed_normal.z, 1.0, epsilon = 1e-12);
}

#[test]
fn test_largest_of_two_holes_is_filled() {
    let mut mesh = create_open_cube(10.0);
    // A second, triangular hole in the bottom.
    mesh.faces.remove(0);

    let result = inpaint_mesh(&mesh, &InpaintParams::default()).unwrap();
    assert_eq!(result.stats.loops_found, 2);
    assert_eq!(result.stats.loop_len, 4);

    let report = report_mesh(&result.mesh);
    assert_eq!(report.boundary_loop_count, 1);
    assert_eq!(report.boundary_edge_count, 3);
}

#[test]
fn test_invalid_input_is_rejected() {
    let mut nan = create_open_cube(10.0);
    nan.vertices[3].position.y = f64::NAN;
    let err = inpaint_mesh(&nan, &InpaintParams::default()).unwrap_err();
    assert!(matches!(err, MeshError::InvalidCoordinate { vertex_index: 3, .. }));

    let mut bad_index = create_open_cube(10.0);
    bad_index.faces.push([0, 1, 42]);
    let err = inpaint_mesh(&bad_index, &InpaintParams::default()).unwrap_err();
    assert!(matches!(err, MeshError::InvalidVertexIndex { vertex_index: 42, .. }));

    let err = inpaint_mesh(&Mesh::new(), &InpaintParams::default()).unwrap_err();
    assert!(matches!(err, MeshError::EmptyMesh { .. }));
}

#[test]
fn test_file_round_trip_obj_to_stl() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("open_cube.obj");
    let output = dir.path().join("filled.stl");
    create_open_cube(10.0).save(&input).unwrap();

    let params = InpaintParams::default().with_upsample_level(1);
    let result = inpaint_file(&input, &output, &params).unwrap();

    let reloaded = Mesh::load(&output).unwrap();
    assert_eq!(reloaded.face_count(), result.mesh.face_count());
    assert!(report_mesh(&reloaded).is_closed_surface());
    assert_relative_eq!(
        reloaded.signed_volume(),
        result.mesh.signed_volume(),
        max_relative = 1e-4
    );
}

#[test]
fn test_obj_with_texture_and_normals() {
    let mut file = NamedTempFile::with_suffix(".obj").unwrap();
    let cube = create_open_cube(2.0);
    for v in &cube.vertices {
        writeln!(file, "v {} {} {}", v.position.x, v.position.y, v.position.z).unwrap();
    }
    writeln!(file, "vt 0 0").unwrap();
    writeln!(file, "vn 0 0 1").unwrap();
    for f in &cube.faces {
        writeln!(file, "f {}/1/1 {}/1/1 {}/1/1", f[0] + 1, f[1] + 1, f[2] + 1).unwrap();
    }
    file.flush().unwrap();

    let mesh = Mesh::load(file.path()).unwrap();
    assert_eq!(mesh.vertex_count(), cube.vertex_count());
    assert_eq!(mesh.face_count(), cube.face_count());
    assert_eq!(report_mesh(&mesh).boundary_edge_count, 4);

    let result = inpaint_mesh(&mesh, &InpaintParams::default()).unwrap();
    assert!(report_mesh(&result.mesh).is_closed_surface());
}

#[test]
fn test_grouped_closed_obj_has_no_hole() {
    let mut file = NamedTempFile::with_suffix(".obj").unwrap();
    let cube = create_test_cube(2.0);
    for v in &cube.vertices {
        writeln!(file, "v {} {} {}", v.position.x, v.position.y, v.position.z).unwrap();
    }
    for (i, f) in cube.faces.iter().enumerate() {
        if i % 4 == 0 {
            writeln!(file, "g side{}", i / 4).unwrap();
        }
        writeln!(file, "f {} {} {}", f[0] + 1, f[1] + 1, f[2] + 1).unwrap();
    }
    file.flush().unwrap();

    let mesh = Mesh::load(file.path()).unwrap();
    assert_eq!(mesh.vertex_count(), 8);
    assert_eq!(mesh.face_count(), 12);

    let err = inpaint_mesh(&mesh, &InpaintParams::default()).unwrap_err();
    assert!(matches!(err, MeshError::NoHole { boundary_loops: 0 }));
}

#[test]
fn test_failed_run_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("closed.stl");
    let output = dir.path().join("out.obj");
    create_test_cube(1.0).save(&input).unwrap();

    let err = inpaint_file(&input, &output, &InpaintParams::default()).unwrap_err();
    assert!(matches!(err, MeshError::NoHole { .. }));
    assert!(!output.exists());
}
