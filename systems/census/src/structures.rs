use std::collections::{BTreeSet, VecDeque};

use colony_core::{CellId, CellView};

/// Sizes of every connected group of two or more bonded cells.
///
/// Groups are found by walking the bond graph, so they reflect the physical
/// topology rather than the organism tags, which may still be converging.
pub(crate) fn bonded_structures(cells: &CellView, frontier: &mut VecDeque<CellId>) -> Vec<usize> {
    let mut visited = BTreeSet::new();
    let mut sizes = Vec::new();

    for start in cells.iter().filter(|cell| !cell.neighbors.is_empty()) {
        if !visited.insert(start.id) {
            continue;
        }

        frontier.clear();
        frontier.push_back(start.id);
        let mut size = 0;
        while let Some(current) = frontier.pop_front() {
            size += 1;
            let Some(cell) = cells.get(current) else {
                continue;
            };
            for neighbor in &cell.neighbors {
                if visited.insert(*neighbor) {
                    frontier.push_back(*neighbor);
                }
            }
        }

        if size > 1 {
            sizes.push(size);
        }
    }

    sizes
}
