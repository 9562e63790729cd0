use crate::error::UmError;

/// Dynamic table of word segments, with LIFO identifier recycling.
///
/// Slot 0 always exists once constructed and is never tombstoned between
/// dispatch steps; the engine is responsible for never unmapping it (the
/// store itself also rejects it, see [`SegmentStore::unmap`]).
///
/// Tombstones are explicit `None` entries rather than packed into the id
/// space, so a use-after-unmap is a catchable error instead of silently
/// indexing whatever segment happens to have been recycled into that slot.
pub struct SegmentStore {
    slots: Vec<Option<Vec<u32>>>,
    recycle: Vec<u32>,
}

impl SegmentStore {
    /// Builds a store whose segment 0 holds `program`.
    pub fn new(program: Vec<u32>) -> Self {
        SegmentStore {
            slots: vec![Some(program)],
            recycle: Vec::new(),
        }
    }

    /// Allocates a new zero-initialized segment of `length` words and
    /// returns its identifier. Reuses the most recently unmapped
    /// identifier if one is available (amortized O(length)).
    pub fn map(&mut self, length: u32) -> u32 {
        let segment = vec![0u32; length as usize];
        let id = if let Some(id) = self.recycle.pop() {
            self.slots[id as usize] = Some(segment);
            id
        } else {
            self.slots.push(Some(segment));
            (self.slots.len() - 1) as u32
        };
        log::debug!(
            "map: id={id} length={length} mapped={}",
            self.mapped_count()
        );
        id
    }

    /// Releases segment `id`. `id` must be mapped and must not be 0.
    pub fn unmap(&mut self, id: u32, pc: u32) -> Result<(), UmError> {
        if id == 0 {
            return Err(UmError::UnmapSegmentZero { pc });
        }
        let slot = self
            .slots
            .get_mut(id as usize)
            .ok_or(UmError::UnmappedSegment { id, pc })?;
        if slot.is_none() {
            return Err(UmError::UnmappedSegment { id, pc });
        }
        *slot = None;
        self.recycle.push(id);
        log::debug!("unmap: id={id} mapped={}", self.mapped_count());
        Ok(())
    }

    /// Reads word `offset` of segment `id`.
    pub fn get(&self, id: u32, offset: u32, pc: u32) -> Result<u32, UmError> {
        let segment = self.segment(id, pc)?;
        segment
            .get(offset as usize)
            .copied()
            .ok_or(UmError::SegmentOutOfBounds {
                id,
                offset,
                len: segment.len(),
                pc,
            })
    }

    /// Writes `word` into offset `offset` of segment `id`.
    pub fn set(&mut self, id: u32, offset: u32, word: u32, pc: u32) -> Result<(), UmError> {
        let len_for_error = self.segment(id, pc)?.len();
        let segment = self.segment_mut(id, pc)?;
        match segment.get_mut(offset as usize) {
            Some(cell) => {
                *cell = word;
                Ok(())
            }
            None => Err(UmError::SegmentOutOfBounds {
                id,
                offset,
                len: len_for_error,
                pc,
            }),
        }
    }

    /// Duplicates `source_id` over segment 0 and returns the new program
    /// length. When `source_id == 0` this is a documented no-op: no
    /// allocation happens and the current length of segment 0 is
    /// returned unchanged, per the program-copy contract.
    pub fn duplicate_to_zero(&mut self, source_id: u32, pc: u32) -> Result<usize, UmError> {
        if source_id == 0 {
            return Ok(self.slots[0].as_ref().expect("segment 0 always mapped").len());
        }
        let copy = self.segment(source_id, pc)?.clone();
        let len = copy.len();
        self.slots[0] = Some(copy);
        Ok(len)
    }

    /// Length of segment 0, the engine's current program length. The
    /// engine reads this directly rather than caching its own copy, so a
    /// load-program duplication is reflected the instant it happens.
    pub fn program_len(&self) -> usize {
        self.slots[0].as_ref().expect("segment 0 always mapped").len()
    }

    /// Number of slots in the table, including tombstoned ones.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True iff the table holds no slots at all. Never true once a store
    /// has been constructed, since slot 0 always exists; provided for the
    /// usual `len`/`is_empty` pairing.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of currently mapped (non-tombstoned) segments.
    pub fn mapped_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    fn segment(&self, id: u32, pc: u32) -> Result<&Vec<u32>, UmError> {
        self.slots
            .get(id as usize)
            .and_then(|slot| slot.as_ref())
            .ok_or(UmError::UnmappedSegment { id, pc })
    }

    fn segment_mut(&mut self, id: u32, pc: u32) -> Result<&mut Vec<u32>, UmError> {
        self.slots
            .get_mut(id as usize)
            .and_then(|slot| slot.as_mut())
            .ok_or(UmError::UnmappedSegment { id, pc })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_assigns_fresh_ids_in_order() {
        let mut store = SegmentStore::new(vec![]);
        assert_eq!(store.map(1), 1);
        assert_eq!(store.map(1), 2);
    }

    #[test]
    fn len_and_mapped_count_track_tombstones() {
        let mut store = SegmentStore::new(vec![]);
        assert_eq!(store.len(), 1); // slot 0 only
        assert!(!store.is_empty());
        assert_eq!(store.mapped_count(), 1);

        let id = store.map(1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.mapped_count(), 2);

        store.unmap(id, 0).unwrap();
        assert_eq!(store.len(), 2); // tombstone keeps the slot
        assert_eq!(store.mapped_count(), 1);
    }

    #[test]
    fn recycling_is_lifo() {
        // Scenario 1 from the spec: map, map, unmap the first, map again.
        let mut store = SegmentStore::new(vec![]);
        let id1 = store.map(1);
        let id2 = store.map(1);
        assert_eq!((id1, id2), (1, 2));
        store.unmap(id1, 0).unwrap();
        let id3 = store.map(1);
        assert_eq!(id3, id1);
    }

    #[test]
    fn map_zeroes_new_segment() {
        let mut store = SegmentStore::new(vec![]);
        let id = store.map(4);
        for offset in 0..4 {
            assert_eq!(store.get(id, offset, 0).unwrap(), 0);
        }
    }

    #[test]
    fn store_then_load_is_identity() {
        let mut store = SegmentStore::new(vec![]);
        let id = store.map(4);
        store.set(id, 2, 0xDEADBEEF, 0).unwrap();
        assert_eq!(store.get(id, 2, 0).unwrap(), 0xDEADBEEF);
        assert_eq!(store.get(id, 0, 0).unwrap(), 0);
        assert_eq!(store.get(id, 1, 0).unwrap(), 0);
        assert_eq!(store.get(id, 3, 0).unwrap(), 0);
    }

    #[test]
    fn unmap_zero_is_fatal() {
        let mut store = SegmentStore::new(vec![1, 2, 3]);
        assert_eq!(
            store.unmap(0, 7).unwrap_err(),
            UmError::UnmapSegmentZero { pc: 7 }
        );
    }

    #[test]
    fn unmap_twice_is_fatal() {
        let mut store = SegmentStore::new(vec![]);
        let id = store.map(1);
        store.unmap(id, 0).unwrap();
        assert!(matches!(
            store.unmap(id, 0),
            Err(UmError::UnmappedSegment { .. })
        ));
    }

    #[test]
    fn access_to_tombstoned_segment_is_fatal() {
        let mut store = SegmentStore::new(vec![]);
        let id = store.map(1);
        store.unmap(id, 0).unwrap();
        assert!(matches!(
            store.get(id, 0, 0),
            Err(UmError::UnmappedSegment { .. })
        ));
    }

    #[test]
    fn out_of_bounds_offset_is_fatal() {
        let mut store = SegmentStore::new(vec![]);
        let id = store.map(2);
        assert!(matches!(
            store.get(id, 2, 0),
            Err(UmError::SegmentOutOfBounds { .. })
        ));
    }

    #[test]
    fn duplicate_zero_onto_zero_is_identity() {
        let mut store = SegmentStore::new(vec![10, 20, 30]);
        let len = store.duplicate_to_zero(0, 0).unwrap();
        assert_eq!(len, 3);
        assert_eq!(store.get(0, 1, 0).unwrap(), 20);
    }

    #[test]
    fn duplicate_replaces_segment_zero() {
        let mut store = SegmentStore::new(vec![1, 2, 3]);
        let id = store.map(2);
        store.set(id, 0, 99, 0).unwrap();
        store.set(id, 1, 100, 0).unwrap();
        let len = store.duplicate_to_zero(id, 0).unwrap();
        assert_eq!(len, 2);
        assert_eq!(store.get(0, 0, 0).unwrap(), 99);
        assert_eq!(store.get(0, 1, 0).unwrap(), 100);
    }
}
