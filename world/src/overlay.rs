//! Session-long memory of player-caused cell mutations.

use std::collections::BTreeMap;

use geo_merge_core::{CellValue, GridCoord};

/// Mapping from coordinate to the value left behind by the last interaction.
///
/// An entry exists only for coordinates the player successfully interacted
/// with; its value may be [`CellValue::EMPTY`] after a pickup or merge.
/// Entries are never removed during a session, so a cell that is evicted and
/// later respawned reflects what the player did to it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OverlayStore {
    entries: BTreeMap<GridCoord, CellValue>,
}

impl OverlayStore {
    /// Creates an empty overlay.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value recorded for `coord`, if the player ever interacted with it.
    #[must_use]
    pub fn get(&self, coord: GridCoord) -> Option<CellValue> {
        self.entries.get(&coord).copied()
    }

    /// Records the latest value for `coord`, replacing any earlier entry.
    pub fn put(&mut self, coord: GridCoord, value: CellValue) {
        let _ = self.entries.insert(coord, value);
    }

    /// Number of remembered coordinates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no interaction was recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates the recorded entries in coordinate order.
    pub fn iter(&self) -> impl Iterator<Item = (GridCoord, CellValue)> + '_ {
        self.entries.iter().map(|(coord, value)| (*coord, *value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_merge_core::Token;

    #[test]
    fn put_replaces_previous_value() {
        let mut overlay = OverlayStore::new();
        let coord = GridCoord::new(4, -2);

        overlay.put(coord, CellValue::holding(Token::MIN));
        overlay.put(coord, CellValue::EMPTY);
        overlay.put(coord, CellValue::EMPTY);

        assert_eq!(overlay.get(coord), Some(CellValue::EMPTY));
        assert_eq!(overlay.len(), 1);
    }

    #[test]
    fn missing_entries_are_absent_not_empty() {
        let overlay = OverlayStore::new();
        assert!(overlay.is_empty());
        assert_eq!(overlay.get(GridCoord::new(0, 0)), None);
    }
}
