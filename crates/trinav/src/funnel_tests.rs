//! Funnel navigation over corridors found on grid meshes

use std::sync::Arc;

use glam::Vec3;
use trinav_common::{distance, Result};

use crate::master_path::Path;
use crate::search::DistanceHeuristic;
use crate::test_mesh_helpers::*;
use crate::tri_nav_mesh::{MeshBuildConfig, TriNavMesh};

/// Three squares along the bottom row plus two up the left column
const L_HOLES: [(usize, usize); 4] = [(1, 1), (2, 1), (1, 2), (2, 2)];

fn l_shaped_path(offset_scale: f32) -> Result<(Path, Vec3, Vec3)> {
    let (verts, indices) = grid_mesh_data(3, 3, &L_HOLES, |_, _| 0.0);
    let config = MeshBuildConfig::default().with_offset_scale(offset_scale);
    let mesh = Arc::new(TriNavMesh::build(&verts, &indices, &config)?);

    let start = Vec3::new(2.7, 0.0, 0.4);
    let goal = Vec3::new(0.4, 0.0, 2.7);
    let path = TriNavMesh::find_path(&mesh, start, goal, DistanceHeuristic::Manhattan)?;
    let goal = path.goal();
    Ok((path, start, goal))
}

#[test]
fn test_goal_in_sight() -> Result<()> {
    let mesh = Arc::new(create_grid_mesh(4, 1)?);
    let start = Vec3::new(0.2, 0.0, 0.5);
    let goal = Vec3::new(3.7, 0.0, 0.6);
    let mut path = TriNavMesh::find_path(&mesh, start, goal, DistanceHeuristic::Manhattan)?;

    assert!(path.master().len() > 2);
    assert_eq!(path.get_target(&start), Some(path.goal()));
    Ok(())
}

#[test]
fn test_corner_is_pulled_inward() -> Result<()> {
    let (mut path, start, goal) = l_shaped_path(0.1)?;
    let corner = Vec3::new(1.0, 0.0, 1.0);

    let target = path.get_target(&start).unwrap();
    assert_ne!(target, goal);
    assert!(distance(&target, &corner) > 0.0);
    assert!(distance(&target, &corner) < 0.2);
    assert!(path.is_in_corridor(&target));

    // The goal is in sight from the corner
    assert_eq!(path.get_target(&target), Some(goal));
    Ok(())
}

#[test]
fn test_zero_offset_returns_vertex() -> Result<()> {
    let (mut path, start, _) = l_shaped_path(0.0)?;
    assert_eq!(path.get_target(&start), Some(Vec3::new(1.0, 0.0, 1.0)));
    Ok(())
}

#[test]
fn test_straight_path_around_corner() -> Result<()> {
    let (mut path, start, goal) = l_shaped_path(0.1)?;

    let points = path.straight_path(start, 16);
    assert_eq!(points.len(), 3);
    assert_eq!(points[0], start);
    assert_eq!(points[2], goal);
    Ok(())
}

#[test]
fn test_repeated_targets_reach_goal() -> Result<()> {
    // A wall splits the grid, leaving a gap along the top row
    let holes = [(2, 0), (2, 1), (2, 2), (2, 3)];
    let mesh = Arc::new(create_grid_mesh_with_holes(5, 5, &holes)?);
    let pairs = [
        (Vec3::new(0.3, 0.0, 0.3), Vec3::new(4.3, 0.0, 0.3)),
        (Vec3::new(4.6, 0.0, 0.2), Vec3::new(1.2, 0.0, 2.4)),
        (Vec3::new(0.7, 0.0, 3.1), Vec3::new(3.4, 0.0, 1.1)),
    ];

    for (start, goal) in pairs {
        let mut path = TriNavMesh::find_path(&mesh, start, goal, DistanceHeuristic::Manhattan)?;
        let goal = path.goal();
        let mut current = start;
        let mut reached = false;

        for _ in 0..path.master().len() + 1 {
            let target = path.get_target(&current).unwrap();
            assert!(path.is_in_corridor(&target), "{} left the corridor", target);
            if target == goal {
                reached = true;
                break;
            }
            current = target;
        }
        assert!(reached, "never reached {} from {}", goal, start);
    }
    Ok(())
}

#[test]
fn test_targets_follow_slope() -> Result<()> {
    let mesh = Arc::new(create_sloped_grid_mesh(3, 1, 0.5)?);
    let start = Vec3::new(0.2, 0.1, 0.5);
    let goal = Vec3::new(2.8, 1.4, 0.5);
    let mut path = TriNavMesh::find_path(&mesh, start, goal, DistanceHeuristic::LongestAxis)?;

    assert!(path.is_in_corridor(&Vec3::new(1.5, 0.75, 0.5)));
    // Far above the slope
    assert!(!path.is_in_corridor(&Vec3::new(1.5, 5.0, 0.5)));
    assert!((path.goal().y - 1.4).abs() < 1e-4);
    assert_eq!(path.get_target(&start), Some(path.goal()));
    Ok(())
}

#[test]
fn test_off_corridor_point_has_no_target() -> Result<()> {
    let mesh = Arc::new(create_grid_mesh(3, 3)?);
    let start = Vec3::new(0.2, 0.0, 0.3);
    let goal = Vec3::new(2.7, 0.0, 0.4);
    let mut path = TriNavMesh::find_path(&mesh, start, goal, DistanceHeuristic::Manhattan)?;

    // Top row is on the mesh but not in a bottom row corridor
    let off = Vec3::new(1.5, 0.0, 2.5);
    assert!(mesh.is_valid_position(&off, 0.1));
    assert!(!path.is_in_corridor(&off));
    assert_eq!(path.get_target(&off), None);
    assert!(path.straight_path(off, 8).is_empty());
    Ok(())
}
