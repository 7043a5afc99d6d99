//! Incremental memory search (the "cheat engine" candidate filter).
//!
//! Walks a [`MemorySpace`]'s linear address range, narrowing a candidate
//! bitmap down by repeatedly applying a [`Predicate`] against the bytes
//! that changed (or didn't) since the previous [`Search::update`].

use std::io::{Read, Write};

use thiserror::Error;

use crate::space::MemorySpace;

/// Bits per word in the candidate bitmap.
const WORD_BITS: usize = u64::BITS as usize;

/// Size of the fallback read-through cache used for regions that can't
/// offer [`MemorySpace::get_physical_mapping`]'s direct slice view (memory
/// that synthesizes values on read instead of storing them in a byte
/// array).
const RING_CAPACITY: usize = 4096;

/// A small read-through window over one region's live bytes, refilled a
/// byte at a time via [`MemorySpace::read`] when a direct slice mapping
/// isn't available. Scans through a region tend to walk forward through
/// adjacent addresses, so caching the last `RING_CAPACITY` bytes read
/// avoids re-issuing a `Memory::read` call (which may cross a `RefCell`
/// borrow or a synthesizing device) for every single byte.
struct LiveCache {
    region_idx: usize,
    /// Global address of `data[0]`.
    origin: u64,
    data: Vec<u8>,
}

impl LiveCache {
    fn new() -> Self {
        Self {
            region_idx: usize::MAX,
            origin: 0,
            data: Vec::new(),
        }
    }

    /// Reads `width` live bytes starting at global address `global`, which
    /// [`MemorySpace::lookup`] has already resolved to region `region_idx`.
    fn read(&mut self, space: &MemorySpace, region_idx: usize, global: u64, width: usize) -> Option<u64> {
        let region = &space.get_regions()[region_idx];
        let covers = self.region_idx == region_idx
            && global >= self.origin
            && global + width as u64 <= self.origin + self.data.len() as u64;
        if !covers {
            self.region_idx = region_idx;
            self.origin = global;
            let remaining = region.base() + region.size() - global;
            let n = (RING_CAPACITY as u64).min(remaining).max(width as u64) as usize;
            self.data.clear();
            for i in 0..n {
                self.data.push(space.read::<u8>(global + i as u64).ok()?);
            }
        }
        let start = (global - self.origin) as usize;
        let bytes = self.data.get(start..start + width)?;
        let mut value = 0u64;
        for &b in bytes.iter().rev() {
            value = (value << 8) | u64::from(b);
        }
        Some(value)
    }
}

/// A single search predicate, evaluated independently at every remaining
/// candidate address.
#[derive(Clone, Copy, Debug)]
pub enum Predicate {
    /// Current value equals the literal.
    Equal(u64),
    /// Current value doesn't equal the literal.
    NotEqual(u64),
    /// Current value is less than the previous snapshot.
    LessThan,
    /// Current value is less than or equal to the previous snapshot.
    LessEqual,
    /// Current value equals the previous snapshot (no change).
    SameAsPrevious,
    /// Current value doesn't equal the previous snapshot (any change).
    DifferentFromPrevious,
    /// Current value is greater than or equal to the previous snapshot.
    GreaterEqual,
    /// Current value is greater than the previous snapshot.
    GreaterThan,
    /// Signed-wrap "less than": classifies `new - old` as negative, i.e.
    /// the counter decreased even accounting for wraparound.
    SignedWrapLess,
    /// Signed-wrap "less than or equal".
    SignedWrapLessEqual,
    /// Signed-wrap "greater than or equal".
    SignedWrapGreaterEqual,
    /// Signed-wrap "greater than".
    SignedWrapGreater,
    /// `new - old == difference` (wrapping subtraction).
    Difference(i64),
}

impl Predicate {
    fn eval(&self, old: u64, new: u64, width: u32) -> bool {
        let sign_bit = 1u64 << (width * 8 - 1);
        let delta = new.wrapping_sub(old);
        match *self {
            Predicate::Equal(v) => new == v,
            Predicate::NotEqual(v) => new != v,
            Predicate::LessThan => new < old,
            Predicate::LessEqual => new <= old,
            Predicate::SameAsPrevious => new == old,
            Predicate::DifferentFromPrevious => new != old,
            Predicate::GreaterEqual => new >= old,
            Predicate::GreaterThan => new > old,
            Predicate::SignedWrapLess => delta & sign_bit != 0 && delta != 0,
            Predicate::SignedWrapLessEqual => delta & sign_bit != 0 || delta == 0,
            Predicate::SignedWrapGreaterEqual => delta & sign_bit == 0,
            Predicate::SignedWrapGreater => delta & sign_bit == 0 && delta != 0,
            Predicate::Difference(d) => delta as i64 == d,
        }
    }
}

/// Width in bytes of the value a [`Search`] compares at each candidate
/// address.
pub type Width = u32;

/// An incremental, stateful memory-search session over one [`MemorySpace`].
#[derive(Debug)]
pub struct Search {
    width: Width,
    len: usize,
    previous_content: Vec<u8>,
    /// One bit per linear address; a set bit means the address is still a
    /// candidate. Word-at-a-time skipping over runs of cleared bits is what
    /// keeps [`Self::filter`] fast once most of the space has been ruled out.
    still_in: Vec<u64>,
    /// Running popcount of `still_in`, maintained incrementally as bits
    /// clear rather than recomputed by scanning the bitmap.
    candidates: usize,
}

impl Search {
    /// Starts a new search over `space`'s full linear range, snapshotting
    /// the current contents and marking every address a candidate.
    #[must_use]
    pub fn new(space: &MemorySpace, width: Width) -> Self {
        let len = space.linear_size() as usize;
        let mut previous_content = vec![0u8; len];
        for (i, byte) in previous_content.iter_mut().enumerate() {
            if let Some((idx, offset)) = space.lookup_linear(i as u64) {
                let global = space_global(space, idx, offset);
                *byte = space.get_physical_mapping(global, 1).map_or(0, |slice| slice[0]);
            }
        }
        let still_in = all_candidates_bitmap(len);
        Self {
            width,
            len,
            previous_content,
            still_in,
            candidates: len,
        }
    }

    /// Re-applies `pred` at every remaining candidate address, clearing any
    /// candidate whose value no longer satisfies it. Does not refresh
    /// `previous_content`.
    pub fn filter(&mut self, space: &MemorySpace, pred: Predicate) {
        let width = self.width as usize;
        let len = self.len;
        let mut cache = LiveCache::new();
        for word_idx in 0..self.still_in.len() {
            if self.still_in[word_idx] == 0 {
                continue;
            }
            let base = word_idx * WORD_BITS;
            let bound = (base + WORD_BITS).min(len);
            for addr in base..bound {
                if addr + width > len || !bit_test(&self.still_in, addr) {
                    continue;
                }
                let keep = match (
                    read_linear(&self.previous_content, addr, width),
                    read_linear_live(space, &mut cache, addr, width),
                ) {
                    (Some(old), Some(new)) => pred.eval(old, new, self.width),
                    _ => false,
                };
                if !keep {
                    bit_clear(&mut self.still_in, addr);
                    self.candidates -= 1;
                }
            }
        }
    }

    /// Refreshes `previous_content` from the live memory space, keeping
    /// every current candidate (equivalent to a no-op [`Predicate`]).
    pub fn update(&mut self, space: &MemorySpace) {
        for addr in 0..self.previous_content.len() {
            if let Some((idx, offset)) = space.lookup_linear(addr as u64) {
                let global = space_global(space, idx, offset);
                if let Some(slice) = space.get_physical_mapping(global, 1) {
                    self.previous_content[addr] = slice[0];
                } else if let Ok(byte) = space.read::<u8>(global) {
                    self.previous_content[addr] = byte;
                }
            }
        }
    }

    /// The number of addresses still marked as candidates.
    #[must_use]
    pub fn get_candidate_count(&self) -> usize {
        self.candidates
    }

    /// Enumerates every remaining candidate address (linear addressing).
    pub fn get_candidates(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.len).filter_map(move |addr| bit_test(&self.still_in, addr).then_some(addr as u64))
    }

    /// Whether `addr` (linear) is still a candidate.
    #[must_use]
    pub fn is_candidate(&self, addr: u64) -> bool {
        let addr = addr as usize;
        addr < self.len && bit_test(&self.still_in, addr)
    }

    /// Finds the next (`forward = true`) or previous candidate address
    /// after `addr`, wrapping within the single region that covers `addr`
    /// rather than the whole linear space.
    #[must_use]
    pub fn cycle_candidate(&self, space: &MemorySpace, addr: u64, forward: bool) -> Option<u64> {
        let (idx, offset) = space.lookup_linear(addr)?;
        let region_base = space.linear_base(idx);
        let region_size = space.get_regions()[idx].size();
        cycle_within_region(self, region_base, region_size, offset as u32, forward)
    }

    /// Serializes this search's state.
    ///
    /// # Errors
    ///
    /// Propagates any I/O error from `w`.
    pub fn save<W: Write>(&self, mut w: W, flavor: SaveFlavor) -> std::io::Result<()> {
        w.write_all(&[flavor as u8])?;
        w.write_all(&(self.previous_content.len() as u64).to_be_bytes())?;
        if matches!(flavor, SaveFlavor::PrevMem | SaveFlavor::All) {
            w.write_all(&self.previous_content)?;
        }
        if matches!(flavor, SaveFlavor::Set | SaveFlavor::All) {
            for byte_idx in 0..self.len.div_ceil(8) {
                let mut packed = 0u8;
                for bit in 0..8 {
                    let addr = byte_idx * 8 + bit;
                    if addr < self.len && bit_test(&self.still_in, addr) {
                        packed |= 1 << bit;
                    }
                }
                w.write_all(&[packed])?;
            }
        }
        Ok(())
    }

    /// Restores a previously [`Self::save`]d search, validating that the
    /// stored linear size matches `space`'s current linear size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SizeMismatch`] if the linear size recorded in the
    /// stream doesn't match `space`, [`Error::Truncated`] if the stream
    /// ends early, or [`Error::Malformed`] on an unrecognized flavor tag.
    pub fn load<R: Read>(mut r: R, space: &MemorySpace, width: Width) -> Result<Self, Error> {
        let mut tag = [0u8; 1];
        r.read_exact(&mut tag).map_err(|_| Error::Truncated)?;
        let flavor = SaveFlavor::from_tag(tag[0]).ok_or(Error::Malformed)?;

        let mut linsize = [0u8; 8];
        r.read_exact(&mut linsize).map_err(|_| Error::Truncated)?;
        let linsize = u64::from_be_bytes(linsize);
        if linsize != space.linear_size() {
            return Err(Error::SizeMismatch {
                expect: space.linear_size(),
                got: linsize,
            });
        }
        let len = linsize as usize;

        let mut previous_content = vec![0u8; len];
        if matches!(flavor, SaveFlavor::PrevMem | SaveFlavor::All) {
            r.read_exact(&mut previous_content).map_err(|_| Error::Truncated)?;
        }

        let mut still_in = all_candidates_bitmap(len);
        let mut candidates = len;
        if matches!(flavor, SaveFlavor::Set | SaveFlavor::All) {
            still_in = vec![0u64; bitmap_words(len)];
            candidates = 0;
            let nbytes = len.div_ceil(8);
            let mut packed = vec![0u8; nbytes];
            r.read_exact(&mut packed).map_err(|_| Error::Truncated)?;
            for addr in 0..len {
                if packed[addr / 8] & (1 << (addr % 8)) != 0 {
                    bit_set(&mut still_in, addr);
                    candidates += 1;
                }
            }
        }

        Ok(Self {
            width,
            len,
            previous_content,
            still_in,
            candidates,
        })
    }
}

/// Finds the next/previous set bit after `local` within a region of
/// `region_size` bits, wrapping at the region's own ends, and reports it
/// back as a linear address (`region_base + result`).
fn cycle_within_region(search: &Search, region_base: u64, region_size: u64, local: u32, forward: bool) -> Option<u64> {
    let region_size = region_size as usize;
    if region_size == 0 {
        return None;
    }
    let local = local as usize % region_size;
    let step: Box<dyn Iterator<Item = usize>> = if forward {
        Box::new((1..=region_size).map(move |d| (local + d) % region_size))
    } else {
        Box::new((1..=region_size).map(move |d| (local + region_size - d) % region_size))
    };
    step.map(|offset| region_base + offset as u64)
        .find(|&linear| bit_test(&search.still_in, linear as usize))
}

fn all_candidates_bitmap(len: usize) -> Vec<u64> {
    let mut words = vec![u64::MAX; bitmap_words(len)];
    let tail = len % WORD_BITS;
    if tail != 0 {
        if let Some(last) = words.last_mut() {
            *last = (1u64 << tail) - 1;
        }
    }
    words
}

fn bitmap_words(len: usize) -> usize {
    len.div_ceil(WORD_BITS)
}

fn bit_test(words: &[u64], addr: usize) -> bool {
    words[addr / WORD_BITS] & (1 << (addr % WORD_BITS)) != 0
}

fn bit_clear(words: &mut [u64], addr: usize) {
    words[addr / WORD_BITS] &= !(1 << (addr % WORD_BITS));
}

fn bit_set(words: &mut [u64], addr: usize) {
    words[addr / WORD_BITS] |= 1 << (addr % WORD_BITS);
}

fn space_global(space: &MemorySpace, idx: usize, offset: u64) -> u64 {
    space.get_regions()[idx].base() + offset
}

fn read_linear(buf: &[u8], addr: usize, width: usize) -> Option<u64> {
    let bytes = buf.get(addr..addr + width)?;
    let mut value = 0u64;
    for &b in bytes.iter().rev() {
        value = (value << 8) | u64::from(b);
    }
    Some(value)
}

/// Reads `width` live bytes at linear address `addr`: the direct-slice fast
/// path when the covering region offers one, falling back to `cache`'s
/// read-through ring for regions that synthesize values instead of storing
/// them in a byte array.
fn read_linear_live(space: &MemorySpace, cache: &mut LiveCache, addr: usize, width: usize) -> Option<u64> {
    let (idx, offset) = space.lookup_linear(addr as u64)?;
    let global = space_global(space, idx, offset);
    if let Some(slice) = space.get_physical_mapping(global, width as u64) {
        let mut value = 0u64;
        for &b in slice.iter().rev() {
            value = (value << 8) | u64::from(b);
        }
        return Some(value);
    }
    cache.read(space, idx, global, width)
}

/// Which parts of a [`Search`] a save/load round-trip carries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SaveFlavor {
    /// Snapshot only (`previous_content`).
    PrevMem = 0,
    /// Candidate bitmap only.
    Set = 1,
    /// Both the snapshot and the candidate bitmap.
    All = 2,
}

impl SaveFlavor {
    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(SaveFlavor::PrevMem),
            1 => Some(SaveFlavor::Set),
            2 => Some(SaveFlavor::All),
            _ => None,
        }
    }
}

/// An error loading a saved [`Search`].
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum Error {
    /// The stream ended before a complete record was read.
    #[error("truncated search snapshot")]
    Truncated,
    /// The save's linear size doesn't match the live memory space.
    #[error("linear size mismatch: expected {expect}, got {got}")]
    SizeMismatch { expect: u64, got: u64 },
    /// The flavor tag wasn't recognized.
    #[error("malformed search snapshot")]
    Malformed,
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::space::{Endian, Memory, Region};
    use crate::Shared;

    fn setup() -> MemorySpace {
        let mut space = MemorySpace::new();
        space.add_region(Region::new("a", 0, 4, Endian::Little, false, Shared::new(vec![10u8, 20, 30, 40])));
        space
    }

    #[test]
    fn equality_predicate_narrows_candidates() {
        let space = setup();
        let mut search = Search::new(&space, 1);
        assert_eq!(search.get_candidate_count(), 4);
        search.filter(&space, Predicate::Equal(20));
        assert_eq!(search.get_candidate_count(), 1);
        assert!(search.is_candidate(1));
    }

    #[test]
    fn update_tracks_changed_value() {
        let mut space = setup();
        let mut search = Search::new(&space, 1);
        space.write::<u8>(0, 99).unwrap();
        search.filter(&space, Predicate::DifferentFromPrevious);
        assert!(search.is_candidate(0));
        assert_eq!(search.get_candidate_count(), 1);
    }

    #[test]
    fn filter_skips_whole_words_of_cleared_candidates() {
        // A region wide enough to span multiple 64-bit bitmap words, with
        // only one surviving candidate in the second word.
        let mut backing = vec![0u8; 140];
        backing[70] = 5;
        let mut space = MemorySpace::new();
        space.add_region(Region::new("big", 0, 140, Endian::Little, false, Shared::new(backing)));
        let mut search = Search::new(&space, 1);
        search.filter(&space, Predicate::Equal(5));
        assert_eq!(search.get_candidate_count(), 1);
        assert!(search.is_candidate(70));
        // The bitmap word covering address 70 should be the only nonzero one.
        let word = 70 / WORD_BITS;
        assert_eq!(search.still_in.iter().enumerate().filter(|(i, &w)| *i != word && w != 0).count(), 0);
    }

    #[test]
    fn cycle_candidate_wraps_within_covering_region() {
        let space = setup();
        let mut search = Search::new(&space, 1);
        search.filter(&space, Predicate::Equal(10));
        // Only address 0 is a candidate; cycling forward from it wraps
        // back to itself within region "a" (addresses 0..4).
        assert_eq!(search.cycle_candidate(&space, 0, true), Some(0));
    }

    #[test]
    fn cycle_candidate_does_not_cross_region_boundary() {
        let mut space = MemorySpace::new();
        space.add_region(Region::new("a", 0, 2, Endian::Little, false, Shared::new(vec![1u8, 1])));
        space.add_region(Region::new("b", 2, 2, Endian::Little, false, Shared::new(vec![1u8, 1])));
        let search = Search::new(&space, 1);
        // Every address in both regions is a candidate; cycling forward
        // from the last address of region "a" must wrap to its own first
        // address, never spilling into region "b".
        assert_eq!(search.cycle_candidate(&space, 1, true), Some(0));
    }

    #[test]
    fn save_load_roundtrip_all() {
        let space = setup();
        let mut search = Search::new(&space, 1);
        search.filter(&space, Predicate::Equal(20));
        let mut bytes = Vec::new();
        search.save(&mut bytes, SaveFlavor::All).unwrap();
        let restored = Search::load(&bytes[..], &space, 1).unwrap();
        assert_eq!(restored.get_candidate_count(), 1);
        assert!(restored.is_candidate(1));
    }

    #[test]
    fn load_rejects_size_mismatch() {
        let space = setup();
        let search = Search::new(&space, 1);
        let mut bytes = Vec::new();
        search.save(&mut bytes, SaveFlavor::PrevMem).unwrap();

        let mut smaller = MemorySpace::new();
        smaller.add_region(Region::new("b", 0, 2, Endian::Little, false, Shared::new(vec![0u8; 2])));
        assert!(matches!(
            Search::load(&bytes[..], &smaller, 1),
            Err(Error::SizeMismatch { expect: 2, got: 4 })
        ));
    }

    /// A device that synthesizes its bytes on read rather than storing them
    /// in an array, so [`Memory::as_slice`] is unavailable and the search
    /// engine must fall back to [`LiveCache`].
    #[derive(Debug)]
    struct Synthesized {
        value: RefCell<u8>,
    }

    impl Memory for Synthesized {
        fn read(&self, _addr: u64) -> crate::space::Result<u8> {
            Ok(*self.value.borrow())
        }

        fn write(&mut self, _addr: u64, data: u8) -> crate::space::Result<()> {
            *self.value.borrow_mut() = data;
            Ok(())
        }
    }

    #[test]
    fn filter_falls_back_to_ring_cache_for_non_direct_mapped_region() {
        let mut space = MemorySpace::new();
        space.add_region(Region::new(
            "reg",
            0,
            4,
            Endian::Little,
            false,
            Shared::new(Synthesized { value: RefCell::new(7) }),
        ));
        let mut search = Search::new(&space, 1);
        assert_eq!(search.get_candidate_count(), 4);
        search.filter(&space, Predicate::Equal(7));
        // Without the ring-buffer fallback, every candidate in a
        // non-direct-mapped region would be (incorrectly) eliminated.
        assert_eq!(search.get_candidate_count(), 4);
    }
}
