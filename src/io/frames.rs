//! Animation frames and surface mesh as JSON.
//!
//! The portable form of an animation: provenance, axis bounds, and one
//! `(tenor, yield)` point list per date, for replay in external tools.
//! Surface meshes serialize absent values as `null`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::{DateRange, Frequency};
use crate::error::AppError;
use crate::present::{AnimationFrames, SurfaceMesh};

#[derive(Debug, Serialize)]
struct FramesFile<'a> {
    tool: &'static str,
    provenance_label: &'static str,
    requested_range: DateRange,
    frequency: Frequency,
    #[serde(flatten)]
    animation: &'a AnimationFrames,
}

pub fn write_frames_json(
    path: &Path,
    animation: &AnimationFrames,
    range: DateRange,
    frequency: Frequency,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create frames JSON '{}': {e}", path.display())))?;
    write_frames(file, animation, range, frequency)
}

pub fn write_frames<W: Write>(
    writer: W,
    animation: &AnimationFrames,
    range: DateRange,
    frequency: Frequency,
) -> Result<(), AppError> {
    let doc = FramesFile {
        tool: "yc",
        provenance_label: animation.provenance.label(),
        requested_range: range,
        frequency,
        animation,
    };
    serde_json::to_writer_pretty(writer, &doc)
        .map_err(|e| AppError::new(4, format!("Failed to write frames JSON: {e}")))
}

#[derive(Debug, Serialize)]
struct SurfaceFile<'a> {
    tool: &'static str,
    provenance_label: &'static str,
    #[serde(flatten)]
    mesh: &'a SurfaceMesh,
}

pub fn write_surface_json(path: &Path, mesh: &SurfaceMesh) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create surface JSON '{}': {e}", path.display())))?;
    write_surface(file, mesh)
}

pub fn write_surface<W: Write>(writer: W, mesh: &SurfaceMesh) -> Result<(), AppError> {
    let doc = SurfaceFile {
        tool: "yc",
        provenance_label: mesh.provenance.label(),
        mesh,
    };
    serde_json::to_writer_pretty(writer, &doc)
        .map_err(|e| AppError::new(4, format!("Failed to write surface JSON: {e}")))
}
