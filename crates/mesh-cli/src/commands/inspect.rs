//! handles inspect command - report the regions in a constraint file.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use mesh_handles::{HandleError, HandleRegistry, Mesh, Vertex, read_assignment_file};
use serde::Serialize;

use crate::{Cli, OutputFormat, output};

#[derive(Debug, Serialize)]
struct ConstraintInfo {
    path: String,
    rows: usize,
    free: usize,
    constrained: usize,
    regions: Vec<RegionInfo>,
    /// Ids below the largest one that have no members.
    unused_ids: Vec<u32>,
}

#[derive(Debug, Serialize)]
struct RegionInfo {
    id: u32,
    vertices: usize,
    first_vertex: u32,
    last_vertex: u32,
}

pub fn run(input: &Path, expected_vertices: Option<usize>, cli: &Cli) -> Result<()> {
    let ids = read_assignment_file(input)
        .with_context(|| format!("Failed to read constraints from {:?}", input))?;
    let mut info = inspect(&ids, expected_vertices)?;
    info.path = input.display().to_string();

    match cli.format {
        OutputFormat::Json => output::print(&info, cli.format, cli.quiet),
        OutputFormat::Text => {
            if !cli.quiet {
                print_text(&info);
            }
        }
    }

    Ok(())
}

fn print_text(info: &ConstraintInfo) {
    println!("{}", "Constraint File".bold().underline());
    println!("  {}: {}", "File".cyan(), info.path);
    println!("  {}: {}", "Rows".cyan(), info.rows);
    println!("  {}: {}", "Free".cyan(), info.free);
    println!("  {}: {}", "Constrained".cyan(), info.constrained);
    println!("  {}: {}", "Regions".cyan(), info.regions.len());
    for region in &info.regions {
        println!(
            "    {} {}: {} vertices ({}..={})",
            "#".dimmed(),
            region.id,
            region.vertices,
            region.first_vertex,
            region.last_vertex
        );
    }
    if !info.unused_ids.is_empty() {
        let ids: Vec<String> = info.unused_ids.iter().map(u32::to_string).collect();
        println!("  {}: {}", "Unused ids".yellow(), ids.join(", "));
    }
}

/// Validate raw rows and summarize them per region.
fn inspect(ids: &[i64], expected_vertices: Option<usize>) -> Result<ConstraintInfo> {
    if let Some(expected) = expected_vertices {
        if expected != ids.len() {
            return Err(HandleError::vertex_count_mismatch(expected, ids.len()).into());
        }
    }

    // Region membership does not depend on positions
    let mut mesh = Mesh::new();
    mesh.vertices = vec![Vertex::from_coords(0.0, 0.0, 0.0); ids.len()];
    let mut registry = HandleRegistry::new(ids.len());
    registry.load_assignment(ids, &mesh)?;

    let regions: Vec<RegionInfo> = registry
        .region_ids()
        .filter_map(|id| {
            let members: Vec<u32> = registry.members(id).collect();
            Some(RegionInfo {
                id,
                vertices: members.len(),
                first_vertex: *members.first()?,
                last_vertex: *members.last()?,
            })
        })
        .collect();
    let unused_ids = (0..registry.region_count() as u32)
        .filter(|&id| registry.centroid(id).is_none())
        .collect();
    let constrained = registry.constrained().len();

    Ok(ConstraintInfo {
        path: String::new(),
        rows: ids.len(),
        free: ids.len() - constrained,
        constrained,
        regions,
        unused_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_counts_regions() {
        let info = inspect(&[-1, 0, 0, 2, -1, 2, 2], None).unwrap();
        assert_eq!(info.rows, 7);
        assert_eq!(info.free, 2);
        assert_eq!(info.constrained, 5);
        assert_eq!(info.regions.len(), 2);
        assert_eq!(info.regions[1].id, 2);
        assert_eq!(info.regions[1].vertices, 3);
        assert_eq!(info.regions[1].first_vertex, 3);
        assert_eq!(info.regions[1].last_vertex, 6);
        assert_eq!(info.unused_ids, vec![1]);
    }

    #[test]
    fn test_inspect_checks_vertex_count() {
        let err = inspect(&[-1, 0], Some(3)).unwrap_err();
        assert!(err.downcast_ref::<HandleError>().is_some());
        assert!(inspect(&[-1, 0], Some(2)).is_ok());
    }

    #[test]
    fn test_inspect_rejects_out_of_range_ids() {
        assert!(inspect(&[0, -4], None).is_err());
        assert!(inspect(&[u32::MAX as i64, -1], None).is_err());
    }

    #[test]
    fn test_run_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regions.txt");
        std::fs::write(&path, "0\n0\n-1\n").unwrap();
        let ids = read_assignment_file(&path).unwrap();
        let info = inspect(&ids, Some(3)).unwrap();
        assert_eq!(info.regions[0].vertices, 2);
    }
}
