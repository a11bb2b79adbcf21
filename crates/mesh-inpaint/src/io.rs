//! Mesh file I/O for OBJ and STL.
//!
//! Only positions and triangle indices are read. Texture coordinates and
//! normals in the input are ignored and never written back.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use hashbrown::HashMap;
use tracing::{debug, info, warn};

use crate::error::{MeshError, MeshResult};
use crate::tracing_ext::log_io_operation;
use crate::validate::validate_mesh_data_strict;
use crate::{Mesh, Vertex};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Obj,
    Stl,
}

impl MeshFormat {
    /// Detect format from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .and_then(|ext| match ext.as_str() {
                "obj" => Some(MeshFormat::Obj),
                "stl" => Some(MeshFormat::Stl),
                _ => None,
            })
    }

    fn require(path: &Path) -> MeshResult<Self> {
        Self::from_path(path).ok_or_else(|| {
            MeshError::unsupported_format(
                path.extension().and_then(|e| e.to_str()).map(String::from),
            )
        })
    }

    /// Short lowercase name, as used in log records.
    pub fn name(self) -> &'static str {
        match self {
            MeshFormat::Obj => "obj",
            MeshFormat::Stl => "stl",
        }
    }
}

/// Load a mesh from file, detecting the format from the extension.
///
/// # Errors
/// [`MeshError::UnsupportedFormat`] for unknown extensions,
/// [`MeshError::IoRead`] / [`MeshError::ParseError`] when the file cannot be
/// read, [`MeshError::EmptyMesh`] when it holds no triangles, and the data
/// validation errors of [`validate_mesh_data_strict`].
pub fn load_mesh(path: &Path) -> MeshResult<Mesh> {
    let format = MeshFormat::require(path)?;
    info!("Loading mesh from {:?} (format: {:?})", path, format);

    let loaded = match format {
        MeshFormat::Obj => load_obj(path),
        MeshFormat::Stl => load_stl(path),
    };
    let mesh = match loaded {
        Ok(mesh) => mesh,
        Err(e) => {
            log_io_operation("load", path, Some(format.name()), false);
            return Err(e);
        }
    };

    if mesh.vertices.is_empty() || mesh.faces.is_empty() {
        return Err(MeshError::empty_mesh(format!(
            "{} has {} vertices and {} faces",
            path.display(),
            mesh.vertex_count(),
            mesh.face_count()
        )));
    }

    if let Some((min, max)) = mesh.bounds() {
        let dims = max - min;
        info!(
            "Loaded mesh: {} vertices, {} faces",
            mesh.vertex_count(),
            mesh.face_count()
        );
        debug!(
            "Dimensions: {:.3} x {:.3} x {:.3}",
            dims.x, dims.y, dims.z
        );
    }

    validate_mesh_data_strict(&mesh)?;
    log_io_operation("load", path, Some(format.name()), true);

    Ok(mesh)
}

/// Load mesh from STL file (binary or ASCII).
///
/// `stl_io` merges coincident corners, so the result is indexed.
fn load_stl(path: &Path) -> MeshResult<Mesh> {
    let file = File::open(path).map_err(|e| MeshError::io_read(path, e))?;
    let mut reader = BufReader::new(file);

    let stl = stl_io::read_stl(&mut reader)
        .map_err(|e| MeshError::parse_error(path, e.to_string()))?;

    debug!(
        "STL contains {} vertices, {} triangles",
        stl.vertices.len(),
        stl.faces.len()
    );

    let mut mesh = Mesh::with_capacity(stl.vertices.len(), stl.faces.len());
    mesh.vertices.extend(
        stl.vertices
            .iter()
            .map(|v| Vertex::from_coords(v.0[0] as f64, v.0[1] as f64, v.0[2] as f64)),
    );

    let mut dropped = 0usize;
    for face in &stl.faces {
        let [a, b, c] = face.vertices.map(|i| i as u32);
        // Zero-area facets that collapsed to a repeated corner.
        if a == b || b == c || a == c {
            dropped += 1;
            continue;
        }
        mesh.faces.push([a, b, c]);
    }
    if dropped > 0 {
        warn!("Skipped {} STL facets with repeated corners", dropped);
    }

    Ok(mesh)
}

/// Load mesh from OBJ file, concatenating every model in it.
fn load_obj(path: &Path) -> MeshResult<Mesh> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        },
    )
    .map_err(|e| match e {
        tobj::LoadError::OpenFileFailed => MeshError::io_read(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()),
        ),
        _ => MeshError::parse_error(path, e.to_string()),
    })?;

    // tobj numbers positions per model; pool them by bit pattern so vertices
    // shared across groups stay shared
    let mut mesh = Mesh::new();
    let mut pool: HashMap<[u32; 3], u32> = HashMap::new();
    for model in &models {
        let obj = &model.mesh;
        debug!(
            "OBJ model '{}': {} positions, {} indices",
            model.name,
            obj.positions.len() / 3,
            obj.indices.len()
        );

        let remap: Vec<u32> = obj
            .positions
            .chunks_exact(3)
            .map(|p| {
                let key = [p[0].to_bits(), p[1].to_bits(), p[2].to_bits()];
                *pool.entry(key).or_insert_with(|| {
                    mesh.vertices.push(Vertex::from_coords(
                        p[0] as f64,
                        p[1] as f64,
                        p[2] as f64,
                    ));
                    (mesh.vertices.len() - 1) as u32
                })
            })
            .collect();

        // Out-of-range indices become u32::MAX and fail validation
        let global = |i: u32| remap.get(i as usize).copied().unwrap_or(u32::MAX);
        mesh.faces.extend(
            obj.indices
                .chunks_exact(3)
                .map(|f| [global(f[0]), global(f[1]), global(f[2])]),
        );
    }

    if models.len() > 1 {
        debug!(
            "Merged {} OBJ models into {} shared vertices",
            models.len(),
            mesh.vertices.len()
        );
    }

    Ok(mesh)
}

/// Save a mesh, choosing the format from the extension.
///
/// # Errors
/// [`MeshError::UnsupportedFormat`] for unknown extensions and
/// [`MeshError::IoWrite`] when the file cannot be written.
pub fn save_mesh(mesh: &Mesh, path: &Path) -> MeshResult<()> {
    save_mesh_as(mesh, path, MeshFormat::require(path)?)
}

/// Save a mesh in an explicit format, whatever the extension of `path`.
pub fn save_mesh_as(mesh: &Mesh, path: &Path, format: MeshFormat) -> MeshResult<()> {
    let result = match format {
        MeshFormat::Obj => save_obj(mesh, path),
        MeshFormat::Stl => save_stl(mesh, path),
    };
    log_io_operation("save", path, Some(format.name()), result.is_ok());
    result
}

/// Save mesh to binary STL with per-face normals.
pub fn save_stl(mesh: &Mesh, path: &Path) -> MeshResult<()> {
    info!("Saving mesh to {:?} (STL format)", path);

    let to_stl = |p: &nalgebra::Point3<f64>| stl_io::Vertex::new([p.x as f32, p.y as f32, p.z as f32]);
    let triangles: Vec<stl_io::Triangle> = mesh
        .triangles()
        .map(|tri| {
            let n = tri.normal().unwrap_or_else(nalgebra::Vector3::zeros);
            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [to_stl(&tri.v0), to_stl(&tri.v1), to_stl(&tri.v2)],
            }
        })
        .collect();

    let file = File::create(path).map_err(|e| MeshError::io_write(path, e))?;
    let mut writer = BufWriter::new(file);
    stl_io::write_stl(&mut writer, triangles.iter()).map_err(|e| MeshError::io_write(path, e))?;
    writer.flush().map_err(|e| MeshError::io_write(path, e))?;

    info!("Saved {} triangles to {:?}", triangles.len(), path);
    Ok(())
}

/// Save mesh to ASCII OBJ.
///
/// Positions and faces survive a reload, but vertex indices may not: the
/// loader numbers vertices in the order faces first use them.
pub fn save_obj(mesh: &Mesh, path: &Path) -> MeshResult<()> {
    info!("Saving mesh to {:?} (OBJ format)", path);

    let file = File::create(path).map_err(|e| MeshError::io_write(path, e))?;
    let mut writer = BufWriter::new(file);
    write_obj(mesh, &mut writer).map_err(|e| MeshError::io_write(path, e))?;

    info!(
        "Saved {} vertices and {} faces to {:?}",
        mesh.vertices.len(),
        mesh.faces.len(),
        path
    );
    Ok(())
}

fn write_obj<W: Write>(mesh: &Mesh, writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "# OBJ file exported by mesh-inpaint")?;
    writeln!(writer, "# Vertices: {}", mesh.vertices.len())?;
    writeln!(writer, "# Faces: {}", mesh.faces.len())?;

    for v in &mesh.vertices {
        let p = v.position;
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }
    // OBJ indices are 1-based.
    for &[a, b, c] in &mesh.faces {
        writeln!(writer, "f {} {} {}", a + 1, b + 1, c + 1)?;
    }
    writer.flush()
}
