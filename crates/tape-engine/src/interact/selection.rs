use std::collections::HashMap;

use crate::scene::Id;

/// One selected record of one draw item. Equality is structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionKey {
    pub draw_item_id: Id,
    pub record_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// `select` replaces the whole selection.
    #[default]
    Single,
    /// `toggle` inserts/removes while preserving the rest.
    Toggle,
}

/// Current selection plus record-count bookkeeping for next/previous
/// navigation within a draw item.
#[derive(Debug, Default)]
pub struct SelectionState {
    mode: SelectionMode,
    selected: Vec<SelectionKey>,
    record_counts: HashMap<Id, u32>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Exclusive in Single mode; in Toggle mode it still replaces the
    /// selection (toggling is `toggle`'s job).
    pub fn select(&mut self, key: SelectionKey) {
        self.selected.clear();
        self.selected.push(key);
    }

    pub fn deselect(&mut self, key: SelectionKey) {
        self.selected.retain(|k| *k != key);
    }

    pub fn toggle(&mut self, key: SelectionKey) {
        if let Some(pos) = self.selected.iter().position(|k| *k == key) {
            self.selected.remove(pos);
        } else {
            if self.mode == SelectionMode::Single {
                self.selected.clear();
            }
            self.selected.push(key);
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, key: SelectionKey) -> bool {
        self.selected.contains(&key)
    }

    pub fn has_selection(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn selected_keys(&self) -> &[SelectionKey] {
        &self.selected
    }

    /// Most recently selected key, if any.
    pub fn current(&self) -> Option<SelectionKey> {
        self.selected.last().copied()
    }

    /// Register how many records a draw item currently has; navigation is
    /// bounded by this.
    pub fn set_record_count(&mut self, draw_item_id: Id, count: u32) {
        self.record_counts.insert(draw_item_id, count);
    }

    /// Move the selection to the next record of the current draw item.
    /// Fails without a current selection, a registered count, or when already
    /// at the last record.
    pub fn select_next(&mut self) -> bool {
        let Some(current) = self.current() else {
            return false;
        };
        let Some(&count) = self.record_counts.get(&current.draw_item_id) else {
            return false;
        };
        if current.record_index + 1 >= count {
            return false;
        }
        self.select(SelectionKey {
            draw_item_id: current.draw_item_id,
            record_index: current.record_index + 1,
        });
        true
    }

    /// Move the selection to the previous record. Fails at index 0.
    pub fn select_previous(&mut self) -> bool {
        let Some(current) = self.current() else {
            return false;
        };
        if current.record_index == 0 {
            return false;
        }
        self.select(SelectionKey {
            draw_item_id: current.draw_item_id,
            record_index: current.record_index - 1,
        });
        true
    }
}
