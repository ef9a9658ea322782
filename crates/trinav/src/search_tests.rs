//! Search scenarios over grid meshes

use std::sync::Arc;

use glam::Vec3;
use trinav_common::Result;

use crate::a_star_search::AStarSearch;
use crate::dijkstra_search::DijkstraSearch;
use crate::master_path::MasterPath;
use crate::search::{CellSearch, DistanceHeuristic, SearchState};
use crate::test_mesh_helpers::*;
use crate::tri_cell::CellRef;
use crate::tri_nav_mesh::TriNavMesh;

fn cell_at(mesh: &TriNavMesh, x: f32, z: f32) -> (CellRef, Vec3) {
    mesh.closest_cell(&Vec3::new(x, 0.0, z), true).unwrap()
}

fn assert_linked(mesh: &TriNavMesh, cells: &[CellRef]) {
    for pair in cells.windows(2) {
        assert!(
            mesh.cell(pair[0]).unwrap().wall_to(pair[1]).is_some(),
            "{} and {} are not linked",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn test_two_by_two_corner_to_corner() -> Result<()> {
    let mesh = Arc::new(create_grid_mesh(2, 2)?);
    let start_cell = CellRef::new(0);
    let goal_cell = CellRef::new(7);
    let start = mesh.cell(start_cell).unwrap().centroid();
    let goal = mesh.cell(goal_cell).unwrap().centroid();

    let mut search = AStarSearch::new(mesh.clone(), DistanceHeuristic::Manhattan);
    search.initialize(start, goal, start_cell, goal_cell);
    assert_eq!(search.process_to_completion(), SearchState::Complete);

    let cells = search.path_cells();
    assert_eq!(cells.first(), Some(&start_cell));
    assert_eq!(cells.last(), Some(&goal_cell));
    // Two diagonals and three square edges
    assert_eq!(cells.len(), 6);
    assert_linked(&mesh, cells);

    let master = MasterPath::new(1, mesh, cells.to_vec())?;
    assert_eq!(master.len(), 6);
    Ok(())
}

#[test]
fn test_all_pairs_complete_both_ways() -> Result<()> {
    let mesh = Arc::new(create_grid_mesh(3, 3)?);
    let mut search = AStarSearch::new(mesh.clone(), DistanceHeuristic::Manhattan);

    for a in 0..mesh.cell_count() as u32 {
        for b in 0..mesh.cell_count() as u32 {
            let (a, b) = (CellRef::new(a), CellRef::new(b));
            let pa = mesh.cell(a).unwrap().centroid();
            let pb = mesh.cell(b).unwrap().centroid();

            search.initialize(pa, pb, a, b);
            assert_eq!(
                search.process_to_completion(),
                SearchState::Complete,
                "{} -> {}",
                a,
                b
            );
            assert_eq!(search.path_cells().first(), Some(&a));
            assert_eq!(search.path_cells().last(), Some(&b));
            assert_linked(&mesh, search.path_cells());
        }
    }
    Ok(())
}

#[test]
fn test_longest_axis_heuristic() -> Result<()> {
    let mesh = Arc::new(create_sloped_grid_mesh(4, 4, 0.25)?);
    let (start_cell, start) = cell_at(&mesh, 0.2, 0.2);
    let (goal_cell, goal) = cell_at(&mesh, 3.8, 3.8);

    let mut search = AStarSearch::new(mesh.clone(), DistanceHeuristic::LongestAxis);
    search.initialize(start, goal, start_cell, goal_cell);
    assert_eq!(search.process_to_completion(), SearchState::Complete);
    assert_linked(&mesh, search.path_cells());
    assert!(search.iterations() > 1);
    Ok(())
}

#[test]
fn test_path_avoids_hole() -> Result<()> {
    let mesh = Arc::new(create_grid_mesh_with_holes(3, 3, &[(1, 1)])?);
    let (start_cell, start) = cell_at(&mesh, 0.2, 1.5);
    let (goal_cell, goal) = cell_at(&mesh, 2.8, 1.5);

    assert!(mesh.closest_cell(&Vec3::new(1.5, 0.0, 1.5), true).is_none());

    let mut search = AStarSearch::new(mesh.clone(), DistanceHeuristic::Manhattan);
    search.initialize(start, goal, start_cell, goal_cell);
    assert_eq!(search.process_to_completion(), SearchState::Complete);
    assert_linked(&mesh, search.path_cells());
    Ok(())
}

#[test]
fn test_search_is_incremental() -> Result<()> {
    let mesh = Arc::new(create_grid_mesh(4, 4)?);
    let (start_cell, start) = cell_at(&mesh, 0.2, 0.2);
    let (goal_cell, goal) = cell_at(&mesh, 3.8, 3.8);

    let mut search = AStarSearch::new(mesh, DistanceHeuristic::Manhattan);
    search.initialize(start, goal, start_cell, goal_cell);
    assert_eq!(search.process(), SearchState::Processing);
    assert!(!search.is_finished());
    assert!(search.path_cells().is_empty());

    let mut steps = 1;
    while !search.process().is_finished() {
        steps += 1;
    }
    assert_eq!(search.state(), SearchState::Complete);
    assert!(steps > 1);
    Ok(())
}

#[test]
fn test_evaluate_reuses_cached_corridor() -> Result<()> {
    let mesh = Arc::new(create_grid_mesh(2, 2)?);
    let cached = Arc::new(MasterPath::new(
        9,
        mesh.clone(),
        [0, 1, 2, 3, 6, 7].into_iter().map(CellRef::new).collect(),
    )?);
    let (a, b) = (CellRef::new(0), CellRef::new(7));
    let pa = mesh.cell(a).unwrap().centroid();
    let pb = mesh.cell(b).unwrap().centroid();

    let mut search = AStarSearch::new(mesh.clone(), DistanceHeuristic::Manhattan);
    search.initialize(pa, pb, a, b);
    let reused = search.evaluate(&[cached.clone()]).unwrap();
    assert_eq!(reused.id(), 9);
    assert_eq!(search.state(), SearchState::Complete);
    assert_eq!(search.path_cells(), cached.cells());

    // Disposed corridors are never reused
    cached.dispose();
    search.initialize(pa, pb, a, b);
    assert!(search.evaluate(&[cached]).is_none());
    assert_eq!(search.state(), SearchState::Initialized);
    Ok(())
}

#[test]
fn test_find_path_snaps_goal() -> Result<()> {
    let mesh = Arc::new(create_sloped_grid_mesh(3, 3, 0.5)?);
    let path = TriNavMesh::find_path(
        &mesh,
        Vec3::new(0.2, 0.1, 0.2),
        Vec3::new(2.5, 10.0, 2.5),
        DistanceHeuristic::Manhattan,
    )?;

    assert!((path.goal().y - 1.25).abs() < 1e-4);
    assert!(path.master().len() >= 2);
    Ok(())
}

/// Corridor along the bottom row of a 3x3 grid
fn bottom_row(mesh: &Arc<TriNavMesh>) -> Result<MasterPath> {
    MasterPath::new(
        1,
        mesh.clone(),
        (0..6).map(CellRef::new).collect(),
    )
}

#[test]
fn test_repair_depth_bound() -> Result<()> {
    let mesh = Arc::new(create_grid_mesh(3, 3)?);
    let corridor = bottom_row(&mesh)?;
    // Lower-left triangle of square (1, 2)
    let start_cell = CellRef::new(14);
    let start = mesh.cell(start_cell).unwrap().centroid();

    let mut search = DijkstraSearch::new(mesh.clone());
    search.initialize(start, None, start_cell, corridor.cells(), 2, false);
    assert_eq!(search.process_to_completion(), SearchState::Failed);
    assert_eq!(search.path_count(), 0);

    search.initialize(start, None, start_cell, corridor.cells(), 3, false);
    assert_eq!(search.process_to_completion(), SearchState::Complete);
    assert_eq!(search.path_count(), 2);

    let mut ends: Vec<CellRef> = (0..search.path_count())
        .filter_map(|i| search.path_cells(i))
        .map(|cells| *cells.last().unwrap())
        .collect();
    ends.sort();
    assert_eq!(ends, vec![CellRef::new(3), CellRef::new(5)]);

    for i in 0..search.path_count() {
        let cells = search.path_cells(i).unwrap();
        assert_eq!(cells[0], start_cell);
        assert_eq!(cells.len(), 4);
        assert_linked(&mesh, cells);
    }
    Ok(())
}

#[test]
fn test_repair_stop_at_first() -> Result<()> {
    let mesh = Arc::new(create_grid_mesh(3, 3)?);
    let corridor = bottom_row(&mesh)?;
    let start_cell = CellRef::new(14);
    let start = mesh.cell(start_cell).unwrap().centroid();

    let mut search = DijkstraSearch::new(mesh);
    search.initialize(start, None, start_cell, corridor.cells(), 8, true);
    assert_eq!(search.process_to_completion(), SearchState::Complete);
    assert_eq!(search.path_count(), 1);
    Ok(())
}
