//! Property-based tests for the storage and layout core.
//!
//! Uses proptest to verify the invariants that must hold across all valid
//! edit sequences: gap-buffer round-tripping, line table consistency, style
//! range non-overlap, wrap coverage, and bidi ordering.

use proptest::prelude::*;
use styledtext::{
    BidiLine, BidiOptions, ColumnMeasurer, LineWrapper, StyleRange, StyleRangeTable, TextStore,
};

// ============================================================================
// Strategies
// ============================================================================

/// Text with a bias toward delimiter-heavy content.
fn edit_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec![
            "a", "b", "xyz", " ", "\n", "\r", "\r\n", "é", "中", "word ",
        ]),
        0..12,
    )
    .prop_map(|parts| parts.concat())
}

/// A sequence of (position%, delete-length%, text) edit instructions;
/// percentages are resolved against the current document length.
fn edit_script() -> impl Strategy<Value = Vec<(u16, u16, String)>> {
    prop::collection::vec((0..=100u16, 0..=100u16, edit_text()), 1..20)
}

fn delimiter_count(text: &str) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let mut count = 0;
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\r' {
            if chars.get(i + 1) == Some(&'\n') {
                i += 1;
            }
            count += 1;
        } else if chars[i] == '\n' {
            count += 1;
        }
        i += 1;
    }
    count
}

fn apply_to_model(model: &mut String, start: usize, len: usize, text: &str) {
    let byte_start = model
        .char_indices()
        .nth(start)
        .map_or(model.len(), |(b, _)| b);
    let byte_end = model
        .char_indices()
        .nth(start + len)
        .map_or(model.len(), |(b, _)| b);
    model.replace_range(byte_start..byte_end, text);
}

// ============================================================================
// Content Properties
// ============================================================================

proptest! {
    /// The store always reads back exactly what a naive string model holds,
    /// regardless of where the gap ended up.
    #[test]
    fn store_matches_string_model(script in edit_script()) {
        let mut store = TextStore::new();
        let mut model = String::new();
        for (pos_pct, len_pct, text) in script {
            let count = store.char_count();
            let start = (usize::from(pos_pct) * count) / 100;
            let len = ((usize::from(len_pct) * (count - start)) / 100).min(count - start);
            store.replace_text_range(start, len, &text).unwrap();
            apply_to_model(&mut model, start, len, &text);
            prop_assert_eq!(store.text(), model.clone());
            prop_assert_eq!(store.char_count(), model.chars().count());
        }
    }

    /// lineCount == delimiterCount + 1 after any edit sequence.
    #[test]
    fn line_count_matches_delimiters(script in edit_script()) {
        let mut store = TextStore::new();
        for (pos_pct, len_pct, text) in script {
            let count = store.char_count();
            let start = (usize::from(pos_pct) * count) / 100;
            let len = ((usize::from(len_pct) * (count - start)) / 100).min(count - start);
            store.replace_text_range(start, len, &text).unwrap();
            prop_assert_eq!(
                store.line_count(),
                delimiter_count(&store.text()) + 1,
                "after edit at {} len {} with {:?}, text {:?}",
                start, len, text, store.text()
            );
        }
    }

    /// Lines partition the document: each line starts where the previous
    /// one ended, and the total covers the whole text.
    #[test]
    fn lines_partition_document(script in edit_script()) {
        let mut store = TextStore::new();
        for (pos_pct, len_pct, text) in script {
            let count = store.char_count();
            let start = (usize::from(pos_pct) * count) / 100;
            let len = ((usize::from(len_pct) * (count - start)) / 100).min(count - start);
            store.replace_text_range(start, len, &text).unwrap();

            let mut offset = 0;
            let mut rebuilt = String::new();
            for i in 0..store.line_count() {
                prop_assert_eq!(store.offset_at_line(i).unwrap(), offset);
                let line_len = store.line_length(i).unwrap();
                rebuilt.push_str(&store.text_range(offset, line_len).unwrap());
                offset += line_len;
            }
            prop_assert_eq!(offset, store.char_count());
            prop_assert_eq!(rebuilt, store.text());
        }
    }

    /// line_at_offset and offset_at_line agree for every offset.
    #[test]
    fn offset_line_queries_agree(script in edit_script()) {
        let mut store = TextStore::new();
        for (pos_pct, len_pct, text) in script {
            let count = store.char_count();
            let start = (usize::from(pos_pct) * count) / 100;
            let len = ((usize::from(len_pct) * (count - start)) / 100).min(count - start);
            store.replace_text_range(start, len, &text).unwrap();
        }
        for offset in 0..=store.char_count() {
            let line = store.line_at_offset(offset).unwrap();
            let line_start = store.offset_at_line(line).unwrap();
            let line_len = store.line_length(line).unwrap();
            prop_assert!(line_start <= offset);
            prop_assert!(
                offset <= line_start + line_len,
                "offset {} outside line {} [{}, {}]",
                offset, line, line_start, line_start + line_len
            );
        }
    }
}

// ============================================================================
// Style Properties
// ============================================================================

fn style_ops() -> impl Strategy<Value = Vec<(u8, u16, u16)>> {
    // (op, start, length): op 0..3 = set bold / set underline / clear
    prop::collection::vec((0..3u8, 0..200u16, 1..60u16), 1..25)
}

proptest! {
    /// Stored ranges never overlap, are sorted, and never have zero length.
    #[test]
    fn style_table_invariants(ops in style_ops()) {
        let mut table = StyleRangeTable::new();
        for (op, start, length) in ops {
            let range = StyleRange::new(usize::from(start), usize::from(length));
            match op {
                0 => table.set_style(range.with_bold()),
                1 => table.set_style(range.with_underline()),
                _ => table.clear_style(usize::from(start), usize::from(length)),
            }
            let ranges = table.ranges();
            for r in ranges {
                prop_assert!(r.length > 0);
            }
            for pair in ranges.windows(2) {
                prop_assert!(pair[0].start + pair[0].length <= pair[1].start);
                // Adjacent ranges with identical attributes must have merged.
                if pair[0].start + pair[0].length == pair[1].start {
                    prop_assert!(!pair[0].same_attributes(&pair[1]));
                }
            }
        }
    }

    /// Shifting for an insert moves the ranges at or after the edit point
    /// and splits a straddled range around the inserted text.
    #[test]
    fn style_shift_insert_property(start in 0..100usize, n in 1..50usize) {
        let mut table = StyleRangeTable::new();
        table.set_style(StyleRange::new(10, 20).with_bold()); // [10, 30)
        table.set_style(StyleRange::new(40, 5).with_underline()); // [40, 45)
        table.shift(start, n as isize);

        let bold: Vec<(usize, usize)> = table
            .ranges()
            .iter()
            .filter(|r| r.is_bold())
            .map(|r| (r.start, r.length))
            .collect();
        let expected_bold = if start <= 10 {
            vec![(10 + n, 20)]
        } else if start < 30 {
            vec![(10, start - 10), (start + n, 30 - start)]
        } else {
            vec![(10, 20)]
        };
        prop_assert_eq!(bold, expected_bold);

        let underline: Vec<(usize, usize)> = table
            .ranges()
            .iter()
            .filter(|r| !r.is_bold())
            .map(|r| (r.start, r.length))
            .collect();
        let expected_underline = if start <= 40 {
            vec![(40 + n, 5)]
        } else if start < 45 {
            vec![(40, start - 40), (start + n, 45 - start)]
        } else {
            vec![(40, 5)]
        };
        prop_assert_eq!(underline, expected_underline);
    }
}

// ============================================================================
// Wrap Properties
// ============================================================================

proptest! {
    /// Visual lines concatenate to exactly the document text, at any width.
    #[test]
    fn wrap_covers_document(text in edit_text(), width in 1..30u32) {
        let store = TextStore::with_text(&text);
        let styles = StyleRangeTable::new();
        let measurer = ColumnMeasurer::new().with_cell_width(1);
        let mut wrapper = LineWrapper::new();
        wrapper.wrap(width, &store, &styles, &measurer).unwrap();

        let rebuilt: String = (0..wrapper.visual_line_count(&store))
            .map(|i| wrapper.visual_text(i, &store).unwrap())
            .collect();
        prop_assert_eq!(rebuilt, store.text());
    }

    /// Incremental rewrap stays identical to a from-scratch wrap.
    #[test]
    fn incremental_wrap_matches_full(script in edit_script(), width in 1..20u32) {
        let mut store = TextStore::new();
        let styles = StyleRangeTable::new();
        let measurer = ColumnMeasurer::new().with_cell_width(1);
        let mut wrapper = LineWrapper::new();
        wrapper.wrap(width, &store, &styles, &measurer).unwrap();

        for (pos_pct, len_pct, text) in script {
            let count = store.char_count();
            let start = (usize::from(pos_pct) * count) / 100;
            let len = ((usize::from(len_pct) * (count - start)) / 100).min(count - start);
            let change = store.replace_text_range(start, len, &text).unwrap();
            wrapper.text_changed(&change, &store, &styles, &measurer).unwrap();

            let mut full = LineWrapper::new();
            full.wrap(width, &store, &styles, &measurer).unwrap();
            prop_assert_eq!(
                wrapper.visual_line_count(&store),
                full.visual_line_count(&store)
            );
            for i in 0..full.visual_line_count(&store) {
                prop_assert_eq!(
                    wrapper.visual_line(i, &store).unwrap(),
                    full.visual_line(i, &store).unwrap()
                );
            }
        }
    }
}

// ============================================================================
// Bidi Properties
// ============================================================================

fn mixed_direction_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec![
            "a", "Z", "1", " ", ".", "\u{5d0}", "\u{5e9}", "\u{627}", "\u{644}", "\u{661}",
            "\u{662}",
        ]),
        0..24,
    )
    .prop_map(|parts| parts.concat())
}

proptest! {
    /// The visual order is always a permutation of the logical positions.
    #[test]
    fn bidi_order_is_permutation(text in mixed_direction_text()) {
        let layout = BidiLine::new(
            &text,
            &BidiOptions::default(),
            &ColumnMeasurer::new(),
        ).unwrap();
        let mut seen = vec![false; layout.len()];
        for &v in layout.order() {
            prop_assert!(!seen[v], "visual index {} repeated", v);
            seen[v] = true;
        }
        prop_assert!(seen.iter().all(|&s| s));
    }

    /// Pure-LTR text reorders to the identity.
    #[test]
    fn bidi_ltr_identity(text in "[a-z ]{0,20}") {
        let layout = BidiLine::new(
            &text,
            &BidiOptions::default(),
            &ColumnMeasurer::new(),
        ).unwrap();
        let expected: Vec<usize> = (0..layout.len()).collect();
        prop_assert_eq!(layout.order(), &expected[..]);
    }

    /// Pure-RTL text reorders to the exact reverse.
    #[test]
    fn bidi_rtl_reverse(text in "[\u{5d0}-\u{5ea}]{0,20}") {
        let layout = BidiLine::new(
            &text,
            &BidiOptions::default(),
            &ColumnMeasurer::new(),
        ).unwrap();
        let n = layout.len();
        let expected: Vec<usize> = (0..n).map(|i| n - 1 - i).collect();
        prop_assert_eq!(layout.order(), &expected[..]);
    }

    /// Direction runs partition any requested span.
    #[test]
    fn bidi_runs_partition(text in mixed_direction_text()) {
        let layout = BidiLine::new(
            &text,
            &BidiOptions::default(),
            &ColumnMeasurer::new(),
        ).unwrap();
        if layout.len() == 0 {
            return Ok(());
        }
        let runs = layout.direction_runs(0, layout.len()).unwrap();
        let mut expected_start = 0;
        for run in &runs {
            prop_assert_eq!(run.logical_start, expected_start);
            prop_assert!(run.logical_end > run.logical_start);
            expected_start = run.logical_end;
        }
        prop_assert_eq!(expected_start, layout.len());
    }

    /// Render positions are consistent with advances in visual order.
    #[test]
    fn bidi_render_positions_accumulate(text in mixed_direction_text()) {
        let layout = BidiLine::new(
            &text,
            &BidiOptions::default(),
            &ColumnMeasurer::new(),
        ).unwrap();
        let mut x = 0;
        for (rp, dx) in layout.render_positions().iter().zip(layout.advances()) {
            prop_assert_eq!(*rp, x);
            x += dx;
        }
        prop_assert_eq!(layout.text_width(), x);
    }
}
