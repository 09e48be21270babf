//! Ordered, non-overlapping style range storage.

use crate::style::StyleRange;

/// How a stored range overlaps an incoming set/clear span.
///
/// The overlap walk in [`StyleRangeTable::set_style`] is a finite-state loop
/// over these cases. At most one stored range can be `StrictSubrange` (only
/// one style can contain another), so that case terminates the walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Overlap {
    /// Starts before the span and ends inside it: truncate its tail.
    EndsBefore,
    /// Starts before and ends after the span: split into before/after pieces.
    StrictSubrange,
    /// Lies entirely within the span: delete it.
    FullyContained,
    /// Starts within the span but ends after it: truncate its head.
    StartsInside,
}

fn classify(existing: &StyleRange, start: usize, end: usize) -> Overlap {
    if existing.start < start {
        if existing.end() > end {
            Overlap::StrictSubrange
        } else {
            Overlap::EndsBefore
        }
    } else if existing.end() <= end {
        Overlap::FullyContained
    } else {
        Overlap::StartsInside
    }
}

/// Sorted, non-overlapping set of style annotations over logical offsets.
///
/// Invariants maintained across every operation:
///
/// - ranges are sorted by `start` and mutually non-overlapping;
/// - zero-length ranges are never stored;
/// - adjacent ranges with identical attributes are merged into one.
///
/// The table is independent of the character buffer but operates on the same
/// logical offset space; [`StyleRangeTable::shift`] keeps it consistent when
/// the buffer is edited.
#[derive(Clone, Debug, Default)]
pub struct StyleRangeTable {
    ranges: Vec<StyleRange>,
}

impl StyleRangeTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored ranges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether no ranges are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// All stored ranges, sorted by start.
    #[must_use]
    pub fn ranges(&self) -> &[StyleRange] {
        &self.ranges
    }

    /// Index of the first stored range that could overlap an offset, i.e.
    /// the first range whose end is past `offset`. Ranges are sorted and
    /// non-overlapping, so ends are sorted too and this is a binary search.
    fn first_past(&self, offset: usize) -> usize {
        self.ranges.partition_point(|r| r.end() <= offset)
    }

    /// Apply a style to its span, replacing whatever was stored there.
    ///
    /// A zero-length range is a no-op. An unstyled range clears instead of
    /// setting.
    pub fn set_style(&mut self, new: StyleRange) {
        if new.length == 0 {
            return;
        }
        if new.is_unstyled() {
            self.clear_style(new.start, new.length);
            return;
        }

        self.carve(new.start, new.end());

        let idx = self.ranges.partition_point(|r| r.start < new.start);
        self.ranges.insert(idx, new);
        self.merge_around(idx);
    }

    /// Remove all styling from `start..start + length`.
    pub fn clear_style(&mut self, start: usize, length: usize) {
        if length == 0 {
            return;
        }
        self.carve(start, start + length);
    }

    /// Cut `start..end` out of the stored ranges: the overlap walk of §set,
    /// without inserting a replacement.
    fn carve(&mut self, start: usize, end: usize) {
        let mut i = self.first_past(start);
        while i < self.ranges.len() && self.ranges[i].start < end {
            match classify(&self.ranges[i], start, end) {
                Overlap::EndsBefore => {
                    self.ranges[i].length = start - self.ranges[i].start;
                    i += 1;
                }
                Overlap::StrictSubrange => {
                    let mut after = self.ranges[i];
                    after.length = after.end() - end;
                    after.start = end;
                    self.ranges[i].length = start - self.ranges[i].start;
                    self.ranges.insert(i + 1, after);
                    break;
                }
                Overlap::FullyContained => {
                    self.ranges.remove(i);
                }
                Overlap::StartsInside => {
                    let old_end = self.ranges[i].end();
                    self.ranges[i].start = end;
                    self.ranges[i].length = old_end - end;
                    break;
                }
            }
        }
    }

    /// Merge the range at `idx` with identical-attribute neighbors it now
    /// touches, preserving the maximal-merged-run invariant.
    fn merge_around(&mut self, mut idx: usize) {
        if idx > 0 {
            let prev = self.ranges[idx - 1];
            let cur = self.ranges[idx];
            if prev.same_attributes(&cur) && prev.end() >= cur.start {
                self.ranges[idx - 1].length = cur.end() - prev.start;
                self.ranges.remove(idx);
                idx -= 1;
            }
        }
        if idx + 1 < self.ranges.len() {
            let cur = self.ranges[idx];
            let next = self.ranges[idx + 1];
            if cur.same_attributes(&next) && cur.end() >= next.start {
                self.ranges[idx].length = next.end() - cur.start;
                self.ranges.remove(idx + 1);
            }
        }
    }

    /// Ranges overlapping `start..start + length`, in order. Ranges are
    /// returned whole, not clipped to the query span.
    #[must_use]
    pub fn styles_in_range(&self, start: usize, length: usize) -> Vec<StyleRange> {
        if length == 0 {
            return Vec::new();
        }
        let end = start + length;
        let first = self.first_past(start);
        self.ranges[first..]
            .iter()
            .take_while(|r| r.start < end)
            .copied()
            .collect()
    }

    /// The style covering `offset`, if any. At most one range can cover any
    /// offset.
    #[must_use]
    pub fn style_at(&self, offset: usize) -> Option<&StyleRange> {
        let idx = self.first_past(offset);
        self.ranges.get(idx).filter(|r| r.contains(offset))
    }

    /// Bold spans overlapping `start..start + length`, clipped to it, as
    /// absolute `(start, end)` pairs. Used to split shaping requests.
    #[must_use]
    pub fn bold_ranges(&self, start: usize, length: usize) -> Vec<(usize, usize)> {
        self.styles_in_range(start, length)
            .iter()
            .filter(|r| r.is_bold())
            .map(|r| (r.start.max(start), r.end().min(start + length)))
            .collect()
    }

    /// Adjust stored ranges for a buffer edit at `edit_start`.
    ///
    /// `delta > 0` is an insertion of `delta` characters: every range whose
    /// start is at or after the edit point shifts right, and a range
    /// straddling the point splits around the (unstyled) inserted text.
    /// `delta < 0` is a deletion of `-delta` characters starting at the edit
    /// point: fully covered ranges are removed, partially covered ranges
    /// shrink, trailing ranges shift left.
    pub fn shift(&mut self, edit_start: usize, delta: isize) {
        if delta > 0 {
            self.shift_insert(edit_start, delta.unsigned_abs());
        } else if delta < 0 {
            self.shift_delete(edit_start, delta.unsigned_abs());
        }
    }

    fn shift_insert(&mut self, edit_start: usize, inserted: usize) {
        let mut split_at = None;
        for (i, r) in self.ranges.iter_mut().enumerate() {
            if r.start >= edit_start {
                r.start += inserted;
            } else if r.end() > edit_start {
                split_at = Some(i);
            }
        }
        if let Some(i) = split_at {
            let mut after = self.ranges[i];
            after.length = after.end() - edit_start;
            after.start = edit_start + inserted;
            self.ranges[i].length = edit_start - self.ranges[i].start;
            self.ranges.insert(i + 1, after);
        }
    }

    fn shift_delete(&mut self, edit_start: usize, deleted: usize) {
        let edit_end = edit_start + deleted;
        self.ranges.retain_mut(|r| {
            if r.end() <= edit_start {
                return true;
            }
            if r.start >= edit_end {
                r.start -= deleted;
                return true;
            }
            // Overlapping the deleted span: keep whatever sticks out.
            let head = edit_start.saturating_sub(r.start);
            let tail = r.end().saturating_sub(edit_end);
            if head + tail == 0 {
                return false;
            }
            r.start = r.start.min(edit_start);
            r.length = head + tail;
            true
        });
        // A deletion can bring identical-attribute neighbors together.
        self.normalize();
    }

    /// Re-merge adjacent identical-attribute ranges after a structural edit.
    fn normalize(&mut self) {
        let mut i = 0;
        while i + 1 < self.ranges.len() {
            let cur = self.ranges[i];
            let next = self.ranges[i + 1];
            if cur.same_attributes(&next) && cur.end() >= next.start {
                self.ranges[i].length = next.end() - cur.start;
                self.ranges.remove(i + 1);
            } else {
                i += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;

    fn bold(start: usize, length: usize) -> StyleRange {
        StyleRange::new(start, length).with_bold()
    }

    fn italicish(start: usize, length: usize) -> StyleRange {
        // Stand-in for a visually distinct style: underline + red.
        StyleRange::new(start, length)
            .with_underline()
            .with_fg(Rgba::RED)
    }

    fn spans(table: &StyleRangeTable) -> Vec<(usize, usize)> {
        table.ranges().iter().map(|r| (r.start, r.length)).collect()
    }

    #[test]
    fn test_set_inside_existing_splits() {
        let mut table = StyleRangeTable::new();
        table.set_style(bold(0, 5));
        table.set_style(italicish(2, 2));

        assert_eq!(spans(&table), vec![(0, 2), (2, 2), (4, 1)]);
        assert!(table.ranges()[0].is_bold());
        assert!(!table.ranges()[1].is_bold());
        assert!(table.ranges()[2].is_bold());
    }

    #[test]
    fn test_set_identical_attributes_merges() {
        let mut table = StyleRangeTable::new();
        table.set_style(bold(0, 3));
        table.set_style(bold(3, 3));
        assert_eq!(spans(&table), vec![(0, 6)]);

        // Overlapping set with identical attributes also collapses.
        table.set_style(bold(4, 10));
        assert_eq!(spans(&table), vec![(0, 14)]);
    }

    #[test]
    fn test_set_spanning_several_ranges() {
        let mut table = StyleRangeTable::new();
        table.set_style(bold(0, 4));
        table.set_style(italicish(6, 4));
        table.set_style(bold(12, 4));

        // Covers the tail of the first, all of the second, the head of the
        // third.
        table.set_style(StyleRange::new(2, 12).with_strikeout());
        assert_eq!(spans(&table), vec![(0, 2), (2, 12), (14, 2)]);
        assert!(table.ranges()[0].is_bold());
        assert!(table.ranges()[2].is_bold());
    }

    #[test]
    fn test_zero_length_set_is_noop() {
        let mut table = StyleRangeTable::new();
        table.set_style(bold(3, 0));
        assert!(table.is_empty());
    }

    #[test]
    fn test_unstyled_set_clears() {
        let mut table = StyleRangeTable::new();
        table.set_style(bold(0, 10));
        table.set_style(StyleRange::new(2, 3));
        assert_eq!(spans(&table), vec![(0, 2), (5, 5)]);
    }

    #[test]
    fn test_clear_middle() {
        let mut table = StyleRangeTable::new();
        table.set_style(bold(0, 10));
        table.clear_style(4, 2);
        assert_eq!(spans(&table), vec![(0, 4), (6, 4)]);
    }

    #[test]
    fn test_style_at_single_result() {
        let mut table = StyleRangeTable::new();
        table.set_style(bold(0, 5));
        table.set_style(italicish(5, 5));

        assert!(table.style_at(4).unwrap().is_bold());
        assert!(!table.style_at(5).unwrap().is_bold());
        assert!(table.style_at(10).is_none());
    }

    #[test]
    fn test_styles_in_range_window() {
        let mut table = StyleRangeTable::new();
        table.set_style(bold(0, 2));
        table.set_style(italicish(4, 2));
        table.set_style(bold(8, 2));

        let hits = table.styles_in_range(1, 4); // [1, 5)
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].start, 0);
        assert_eq!(hits[1].start, 4);

        assert!(table.styles_in_range(2, 2).is_empty());
        assert!(table.styles_in_range(0, 0).is_empty());
    }

    #[test]
    fn test_shift_insert_moves_trailing() {
        let mut table = StyleRangeTable::new();
        table.set_style(bold(5, 3));
        table.shift(2, 4);
        assert_eq!(spans(&table), vec![(9, 3)]);

        // Insert exactly at the range start still shifts it.
        table.shift(9, 1);
        assert_eq!(spans(&table), vec![(10, 3)]);
    }

    #[test]
    fn test_shift_insert_splits_straddled_range() {
        let mut table = StyleRangeTable::new();
        table.set_style(bold(0, 6));
        table.shift(3, 2);
        assert_eq!(spans(&table), vec![(0, 3), (5, 3)]);
    }

    #[test]
    fn test_shift_delete_shrinks_straddled_range() {
        let mut table = StyleRangeTable::new();
        table.set_style(bold(1, 5));
        table.shift(2, -2); // delete [2, 4)
        assert_eq!(spans(&table), vec![(1, 3)]);
    }

    #[test]
    fn test_shift_delete_removes_covered_range() {
        let mut table = StyleRangeTable::new();
        table.set_style(bold(3, 2));
        table.set_style(italicish(8, 2));
        table.shift(2, -4); // delete [2, 6) covering the bold range
        assert_eq!(spans(&table), vec![(4, 2)]);
        assert!(!table.ranges()[0].is_bold());
    }

    #[test]
    fn test_shift_delete_rejoins_identical_neighbors() {
        let mut table = StyleRangeTable::new();
        table.set_style(bold(0, 2));
        table.set_style(bold(4, 2));
        assert_eq!(spans(&table), vec![(0, 2), (4, 2)]);

        table.shift(2, -2); // delete the unstyled middle
        assert_eq!(spans(&table), vec![(0, 4)]);
    }

    #[test]
    fn test_non_overlap_invariant_under_mixed_ops() {
        let mut table = StyleRangeTable::new();
        table.set_style(bold(0, 8));
        table.set_style(italicish(4, 8));
        table.set_style(bold(2, 3));
        table.clear_style(3, 2);
        table.shift(1, 5);
        table.shift(0, -2);

        let ranges = table.ranges();
        for pair in ranges.windows(2) {
            assert!(pair[0].end() <= pair[1].start, "ranges overlap: {pair:?}");
        }
        for r in ranges {
            assert!(r.length > 0, "zero-length range stored: {r:?}");
        }
    }
}
