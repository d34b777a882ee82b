//! Windowed materialisation of cells around the player.

use std::collections::BTreeMap;

use geo_merge_core::{
    CellSnapshot, CellValue, CellWindow, Event, GeoPoint, GridCoord, SeedSource,
};
use geo_merge_system_generator::SpawnTable;
use tracing::{debug, trace};

use crate::overlay::OverlayStore;

/// Materialised cell owned by the grid manager.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    coord: GridCoord,
    value: CellValue,
    in_range: bool,
}

impl Cell {
    pub(crate) fn value(&self) -> CellValue {
        self.value
    }

    pub(crate) fn set_value(&mut self, value: CellValue) {
        self.value = value;
    }

    pub(crate) fn in_range(&self) -> bool {
        self.in_range
    }

    pub(crate) fn snapshot(&self) -> CellSnapshot {
        CellSnapshot {
            coord: self.coord,
            value: self.value,
            in_range: self.in_range,
        }
    }
}

/// Owns the loaded cells and keeps them aligned with the load window.
#[derive(Debug)]
pub(crate) struct GridManager {
    cell_size: f64,
    collection_range: f64,
    spawn_table: SpawnTable,
    window: Option<CellWindow>,
    cells: BTreeMap<GridCoord, Cell>,
}

impl GridManager {
    pub(crate) fn new(cell_size: f64, collection_range: f64, spawn_table: SpawnTable) -> Self {
        Self {
            cell_size,
            collection_range,
            spawn_table,
            window: None,
            cells: BTreeMap::new(),
        }
    }

    pub(crate) fn window(&self) -> Option<CellWindow> {
        self.window
    }

    /// Evicts cells outside `window`, then spawns every eligible coordinate
    /// inside it that has no loaded cell yet.
    ///
    /// Overlay entries take precedence over the generator. Eviction never
    /// touches the overlay.
    pub(crate) fn sync(
        &mut self,
        window: CellWindow,
        overlay: &OverlayStore,
        player: GeoPoint,
        out_events: &mut Vec<Event>,
    ) {
        let evicted: Vec<GridCoord> = self
            .cells
            .keys()
            .copied()
            .filter(|coord| !window.contains(*coord))
            .collect();
        for coord in &evicted {
            let _ = self.cells.remove(coord);
            trace!(%coord, "evicted cell");
            out_events.push(Event::CellEvicted { coord: *coord });
        }

        let mut spawned = 0usize;
        for coord in window.iter() {
            if self.cells.contains_key(&coord) {
                continue;
            }

            let (value, source) = match overlay.get(coord) {
                Some(value) => (value, SeedSource::Overlay),
                None => match self.spawn_table.generate(coord) {
                    Some(token) => (CellValue::holding(token), SeedSource::Generated),
                    None => continue,
                },
            };

            let in_range = within_range(coord, player, self.cell_size, self.collection_range);
            let _ = self.cells.insert(
                coord,
                Cell {
                    coord,
                    value,
                    in_range,
                },
            );
            spawned += 1;
            trace!(%coord, %value, ?source, in_range, "spawned cell");
            out_events.push(Event::CellSpawned {
                coord,
                value,
                source,
                in_range,
            });
        }

        self.window = Some(window);
        debug!(
            evicted = evicted.len(),
            spawned,
            loaded = self.cells.len(),
            "synchronised load window"
        );
    }

    /// Recomputes the range flag of every loaded cell against `player`.
    pub(crate) fn recalculate_range(&mut self, player: GeoPoint, out_events: &mut Vec<Event>) {
        let (cell_size, collection_range) = (self.cell_size, self.collection_range);
        for cell in self.cells.values_mut() {
            let in_range = within_range(cell.coord, player, cell_size, collection_range);
            if in_range != cell.in_range {
                cell.in_range = in_range;
                out_events.push(Event::CellRangeChanged {
                    coord: cell.coord,
                    in_range,
                });
            }
        }
    }

    pub(crate) fn cell(&self, coord: GridCoord) -> Option<&Cell> {
        self.cells.get(&coord)
    }

    pub(crate) fn cell_mut(&mut self, coord: GridCoord) -> Option<&mut Cell> {
        self.cells.get_mut(&coord)
    }

    pub(crate) fn snapshots(&self) -> Vec<CellSnapshot> {
        self.cells.values().map(Cell::snapshot).collect()
    }
}

fn within_range(coord: GridCoord, player: GeoPoint, cell_size: f64, collection_range: f64) -> bool {
    coord.center(cell_size).distance_to(player) < collection_range
}
