use std::collections::HashMap;

use crate::{frame_pool::FrameId, reference::Vpn};

/// Per-process mapping from virtual page number to frame.
#[derive(Clone, Default, Debug)]
pub struct PageTable {
    table: HashMap<Vpn, FrameId>,
}

impl PageTable {
    pub fn new() -> Self {
        PageTable {
            table: HashMap::new(),
        }
    }

    pub fn get(&self, vpn: Vpn) -> Option<FrameId> {
        self.table.get(&vpn).copied()
    }

    pub fn set(&mut self, vpn: Vpn, frame: FrameId) -> Option<FrameId> {
        self.table.insert(vpn, frame)
    }

    pub fn remove(&mut self, vpn: Vpn) -> Option<FrameId> {
        self.table.remove(&vpn)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Vpn, FrameId)> + '_ {
        self.table.iter().map(|(&vpn, &frame)| (vpn, frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_previous_frame() {
        let mut table = PageTable::new();

        assert_eq!(table.set(7, 1), None);
        assert_eq!(table.set(7, 3), Some(1));
        assert_eq!(table.get(7), Some(3));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn remove_forgets_the_page() {
        let mut table = PageTable::new();
        table.set(2, 0);

        assert_eq!(table.remove(2), Some(0));
        assert_eq!(table.get(2), None);
        assert!(table.is_empty());
        assert_eq!(table.remove(2), None);
    }
}
