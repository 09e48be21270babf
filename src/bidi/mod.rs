//! Bidirectional text reordering for a single visual line.
//!
//! A [`BidiLine`] is built per line of text and answers every
//! direction-dependent question about it: the logical→visual permutation,
//! per-character advances and render positions, maximal single-direction
//! runs, and the caret geometry at direction boundaries.
//!
//! Character classification and embedding levels come from the Unicode
//! Bidirectional Algorithm (UAX #9) via `unicode-bidi`; the permutation is
//! derived from the levels with the standard L2 run-reversal pass.
//! Navigation semantics follow the editing rules rather than plain UAX #9:
//! local (Arabic-Indic) numbers render left-to-right but are treated as
//! right-to-left for keyboard navigation, and that asymmetry is load-bearing
//! for caret placement.

use crate::error::{Error, Result};
use crate::measure::{TextMeasurer, styled_advances};
use unicode_bidi::{BidiClass, BidiInfo, Level};

/// Direction class of one character, as seen by caret navigation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharClass {
    /// Strong left-to-right (includes European digits).
    Ltr,
    /// Strong right-to-left (Hebrew, Arabic).
    Rtl,
    /// Local number (Arabic-Indic digits): renders LTR, navigates RTL.
    LocalNumber,
    /// No strong direction.
    Neutral,
}

/// The navigation direction that brought the caret to an offset. Used to
/// disambiguate caret placement at direction boundaries, where one logical
/// offset has two visual positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaretDirection {
    /// Arrived moving forward (cursor-right).
    Next,
    /// Arrived moving backward (cursor-left).
    Previous,
}

/// A maximal span of one direction within a line.
///
/// Runs partition the requested range; each renders left-to-right on screen
/// even when its characters are stored right-to-left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirectionRun {
    /// Logical span (exclusive end).
    pub logical_start: usize,
    pub logical_end: usize,
    /// Visual span (exclusive end).
    pub visual_start: usize,
    pub visual_end: usize,
    /// Pixel x where the run starts rendering.
    pub x_start: u32,
    /// Pixel x just past the run's last glyph.
    pub x_stop: u32,
}

/// Layout options for building a [`BidiLine`].
#[derive(Clone, Debug)]
pub struct BidiOptions {
    /// Tab stop distance in pixels.
    pub tab_width: u32,
    /// Bold `(start, end)` character spans; each is shaped as its own
    /// request so ligatures never straddle a weight change.
    pub bold_ranges: Vec<(usize, usize)>,
    /// Optional extra run boundaries (directional overrides). Must start at
    /// 0, end at the text length, and be sorted.
    pub segments: Option<Vec<usize>>,
}

impl Default for BidiOptions {
    fn default() -> Self {
        Self {
            tab_width: 64,
            bold_ranges: Vec::new(),
            segments: None,
        }
    }
}

/// Reordering data for one line of text.
///
/// All arrays are sized to the character count: `order` maps logical to
/// visual index, `dx` holds the advance of each *visual* position,
/// `render_positions` the accumulated x of each visual position, and
/// `classes` the per-character direction class in logical order.
#[derive(Clone, Debug)]
pub struct BidiLine {
    order: Vec<usize>,
    dx: Vec<u32>,
    render_positions: Vec<u32>,
    classes: Vec<CharClass>,
    segments: Vec<usize>,
}

impl BidiLine {
    /// Reorder `text` for display.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for malformed segment offsets.
    pub fn new(text: &str, options: &BidiOptions, measurer: &dyn TextMeasurer) -> Result<Self> {
        let chars: Vec<char> = text.chars().collect();
        let n = chars.len();

        let segments = match &options.segments {
            Some(offsets) => {
                let sorted = offsets.windows(2).all(|w| w[0] <= w[1]);
                if offsets.len() < 2
                    || !sorted
                    || offsets[0] != 0
                    || *offsets.last().expect("checked len") != n
                {
                    return Err(Error::InvalidArgument(format!(
                        "segment offsets must run from 0 to {n}"
                    )));
                }
                offsets.clone()
            }
            None => vec![0, n],
        };

        let classes: Vec<CharClass> = chars.iter().map(|&c| classify(c)).collect();

        if n == 0 {
            return Ok(Self {
                order: Vec::new(),
                dx: Vec::new(),
                render_positions: Vec::new(),
                classes,
                segments,
            });
        }

        // Embedding levels per char; the paragraph direction is the
        // widget's, which is left-to-right here.
        let info = BidiInfo::new(text, Some(Level::ltr()));
        let mut levels = Vec::with_capacity(n);
        for (byte_idx, _) in text.char_indices() {
            levels.push(info.levels[byte_idx].number());
        }
        let order = visual_order(&levels);

        // Advances in logical order, bold spans measured separately, then
        // scattered to visual positions.
        let logical_dx = styled_advances(measurer, text, &options.bold_ranges);
        let mut dx = vec![0u32; n];
        for (logical, &advance) in logical_dx.iter().enumerate() {
            dx[order[logical]] = advance;
        }

        let mut line = Self {
            order,
            dx,
            render_positions: Vec::new(),
            classes,
            segments,
        };
        line.apply_tab_stops(&chars, options.tab_width, measurer);
        line.compute_render_positions();
        Ok(line)
    }

    /// Number of characters in the line.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the line is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The logical→visual permutation.
    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Advance of each visual position.
    #[must_use]
    pub fn advances(&self) -> &[u32] {
        &self.dx
    }

    /// Per-character direction classes in logical order.
    #[must_use]
    pub fn classes(&self) -> &[CharClass] {
        &self.classes
    }

    /// Pixel x of each visual position.
    #[must_use]
    pub fn render_positions(&self) -> &[u32] {
        &self.render_positions
    }

    /// Total rendered width of the line.
    #[must_use]
    pub fn text_width(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            let last = self.len() - 1;
            self.render_positions[last] + self.dx[last]
        }
    }

    /// The visual position of a logical offset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] past the last character.
    pub fn visual_offset(&self, logical: usize) -> Result<usize> {
        self.order.get(logical).copied().ok_or(Error::OutOfRange {
            index: logical,
            max: self.len().saturating_sub(1),
        })
    }

    /// The logical offset of a visual position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] past the last character.
    pub fn logical_offset(&self, visual: usize) -> Result<usize> {
        if visual >= self.len() {
            return Err(Error::OutOfRange {
                index: visual,
                max: self.len().saturating_sub(1),
            });
        }
        Ok(self
            .order
            .iter()
            .position(|&v| v == visual)
            .expect("order is a permutation"))
    }

    fn is_rtl(&self, logical: usize) -> bool {
        self.classes.get(logical) == Some(&CharClass::Rtl)
    }

    fn is_local_number(&self, logical: usize) -> bool {
        self.classes.get(logical) == Some(&CharClass::LocalNumber)
    }

    /// Right-to-left as the keyboard sees it: local numbers count as RTL
    /// here, unlike for rendering.
    fn is_rtl_input(&self, logical: usize) -> bool {
        matches!(
            self.classes.get(logical),
            Some(&CharClass::Rtl | &CharClass::LocalNumber)
        )
    }

    fn is_segment_start(&self, logical: usize) -> bool {
        self.segments.contains(&logical)
    }

    /// The last logical offset of the ligature containing `offset`, or
    /// `offset` itself outside a ligature. Ligature continuations are
    /// zero-advance characters; only right-to-left scripts ligate.
    #[must_use]
    pub fn ligature_end_offset(&self, offset: usize) -> usize {
        if !self.is_rtl(offset) {
            return offset;
        }
        let mut end = offset;
        while end + 1 < self.len() && self.is_rtl(end + 1) && self.dx[self.order[end + 1]] == 0 {
            end += 1;
        }
        end
    }

    /// The first logical offset of the ligature containing `offset`.
    #[must_use]
    pub fn ligature_start_offset(&self, offset: usize) -> usize {
        if !self.is_rtl(offset) {
            return offset;
        }
        let mut start = offset;
        while start > 0 && self.is_rtl(start) && self.dx[self.order[start]] == 0 {
            start -= 1;
        }
        start
    }

    /// The maximal single-direction runs covering
    /// `logical_start..logical_start + length`, in logical order.
    ///
    /// A zero-length span answers one degenerate run pinned at the span's
    /// insertion point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] when the span exceeds the line.
    pub fn direction_runs(&self, logical_start: usize, length: usize) -> Result<Vec<DirectionRun>> {
        let n = self.len();
        if logical_start + length > n {
            return Err(Error::OutOfRange {
                index: logical_start + length,
                max: n,
            });
        }
        if length == 0 {
            let x = self.caret_x(logical_start, CaretDirection::Next);
            return Ok(vec![DirectionRun {
                logical_start,
                logical_end: logical_start,
                visual_start: 0,
                visual_end: 0,
                x_start: x,
                x_stop: x,
            }]);
        }

        let logical_end = logical_start + length; // exclusive
        let mut runs = Vec::new();
        let mut seg_idx = 0;
        while seg_idx + 2 < self.segments.len() && self.segments[seg_idx + 1] <= logical_start {
            seg_idx += 1;
        }
        let mut seg_end = self.segments[seg_idx + 1];

        let mut run_start = logical_start;
        let mut i = logical_start;
        while i < logical_end {
            let rtl = self.is_rtl(run_start);
            // Extend while the next character continues this run's visual
            // stepping: one left for RTL, one right for LTR.
            while i + 1 < logical_end
                && i + 1 < seg_end
                && ((rtl && self.order[i + 1] + 1 == self.order[i])
                    || (!rtl && self.order[i + 1] == self.order[i] + 1))
            {
                i += 1;
            }
            runs.push(self.make_run(run_start, i));
            i += 1;
            run_start = i;
            if run_start == seg_end && seg_idx + 2 < self.segments.len() {
                seg_idx += 1;
                seg_end = self.segments[seg_idx + 1];
            }
        }
        Ok(runs)
    }

    fn make_run(&self, logical_start: usize, logical_last: usize) -> DirectionRun {
        let a = self.order[logical_start];
        let b = self.order[logical_last];
        let (visual_start, visual_last) = if b < a { (b, a) } else { (a, b) };
        DirectionRun {
            logical_start,
            logical_end: logical_last + 1,
            visual_start,
            visual_end: visual_last + 1,
            x_start: self.render_positions[visual_start],
            x_stop: self.render_positions[visual_last] + self.dx[visual_last],
        }
    }

    /// The logical offset of the character rendered at pixel `x`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] past the end of the line.
    pub fn offset_at_x(&self, x: u32) -> Result<usize> {
        if self.is_empty() {
            return Ok(0);
        }
        if x >= self.text_width() {
            return Err(Error::OutOfRange {
                index: x as usize,
                max: self.text_width() as usize,
            });
        }
        self.logical_offset(self.visual_offset_at_x(x))
    }

    /// Caret offset and arrival direction for a click at pixel `x`.
    ///
    /// The caret lands in front of or behind the clicked character
    /// depending on which visual half was hit and on the character's
    /// direction; clicking inside a ligature resolves to its start (leading
    /// half) or its end + 1 (trailing half), never an interior offset. The
    /// returned direction feeds [`caret_x`](Self::caret_x) so the caret
    /// lands on the correct side of a direction boundary.
    #[must_use]
    pub fn caret_offset_and_direction_at_x(&self, x: u32) -> (usize, CaretDirection) {
        let n = self.len();
        if n == 0 {
            return (0, CaretDirection::Next);
        }
        if x >= self.text_width() {
            return (n, CaretDirection::Next);
        }
        let visual = self.visual_offset_at_x(x);
        let halfway = self.render_positions[visual] + self.dx[visual] / 2;
        let visual_left = x <= halfway;
        let offset = self
            .logical_offset(visual)
            .expect("visual offset within line");

        if self.is_rtl(offset) {
            if visual_left {
                // Caret goes to the right of the character, as if NEXT was
                // pressed; land after the whole ligature.
                (self.ligature_end_offset(offset) + 1, CaretDirection::Next)
            } else {
                (offset, CaretDirection::Previous)
            }
        } else if visual_left {
            (offset, CaretDirection::Previous)
        } else {
            (offset + 1, CaretDirection::Next)
        }
    }

    /// Pixel x of the caret at a logical offset, arriving from `direction`.
    ///
    /// At a boundary between runs of different directionality the same
    /// logical offset has two candidate positions; the navigation direction
    /// picks one, matching keyboard cursor behavior. Local numbers count as
    /// a direction boundary for backward navigation but keep the caret on
    /// their right for forward navigation.
    #[must_use]
    pub fn caret_x(&self, logical_offset: usize, direction: CaretDirection) -> u32 {
        let n = self.len();
        if n == 0 {
            return 0;
        }
        if logical_offset >= n {
            // Past the end: after the visually last character of the final
            // logical position.
            let last = n - 1;
            let visual = self.order[last];
            return if self.is_rtl(last) {
                self.render_positions[visual]
            } else {
                self.render_positions[visual] + self.dx[visual]
            };
        }
        if logical_offset == 0 {
            let visual = self.order[0];
            return if self.is_rtl(0) {
                self.render_positions[visual] + self.dx[visual]
            } else {
                self.render_positions[visual]
            };
        }

        let offset = logical_offset;
        if direction == CaretDirection::Next
            && (self.is_rtl(offset) != self.is_rtl(offset - 1)
                || self.is_local_number(offset) != self.is_local_number(offset - 1)
                || self.is_segment_start(offset))
        {
            // Moving forward across a boundary: stay with the run being
            // left. Local numbers are not RTL here so the caret lands to
            // the right of the number.
            let visual = self.order[offset - 1];
            return if self.is_rtl(offset - 1) {
                self.render_positions[visual]
            } else {
                self.render_positions[visual] + self.dx[visual]
            };
        }
        if direction == CaretDirection::Previous
            && self.is_rtl_input(offset) != self.is_rtl_input(offset - 1)
        {
            // Moving backward across a boundary: local numbers count as RTL
            // so the caret stays in the left-to-right segment, in front of
            // its first character.
            let visual = self.order[offset];
            return if self.is_rtl(offset - 1) {
                self.render_positions[visual]
            } else {
                self.render_positions[visual] + self.dx[visual]
            };
        }

        let visual = self.order[offset];
        if self.is_rtl(offset) {
            self.render_positions[visual] + self.dx[visual]
        } else {
            self.render_positions[visual]
        }
    }

    /// Binary search for the visual position whose cell contains `x`. Only
    /// valid for `x` within the rendered width.
    fn visual_offset_at_x(&self, x: u32) -> usize {
        let mut low: isize = -1;
        let mut high = self.len() as isize;
        while high - low > 1 {
            let mid = (high + low) / 2;
            let offset = usize::try_from(mid).expect("mid is non-negative");
            if x < self.render_positions[offset] + self.dx[offset] {
                high = mid;
            } else {
                low = mid;
            }
        }
        usize::try_from(high).expect("x within rendered width")
    }

    /// Snap each tab to the next tab stop, accumulating x in *logical*
    /// order. A stop closer than one space width to the previous character
    /// skips to the following stop.
    fn apply_tab_stops(&mut self, chars: &[char], tab_width: u32, measurer: &dyn TextMeasurer) {
        if tab_width == 0 || !chars.contains(&'\t') {
            return;
        }
        let space_width = measurer.advances(" ", false).first().copied().unwrap_or(0);
        let mut x: u32 = 0;
        let mut logical = 0;
        for (tab_index, _) in chars.iter().enumerate().filter(|&(_, &c)| c == '\t') {
            while logical < tab_index {
                x += self.dx[self.order[logical]];
                logical += 1;
            }
            let mut tab_stop = x + tab_width;
            if tab_width - tab_stop % tab_width < space_width {
                tab_stop += tab_width;
            }
            tab_stop -= tab_stop % tab_width;
            self.dx[self.order[tab_index]] = tab_stop - x;
        }
    }

    fn compute_render_positions(&mut self) {
        let mut positions = Vec::with_capacity(self.dx.len());
        let mut x = 0u32;
        for &advance in &self.dx {
            positions.push(x);
            x += advance;
        }
        self.render_positions = positions;
    }
}

/// Map a character to its navigation class.
fn classify(c: char) -> CharClass {
    match unicode_bidi::bidi_class(c) {
        BidiClass::L | BidiClass::EN => CharClass::Ltr,
        BidiClass::R | BidiClass::AL => CharClass::Rtl,
        BidiClass::AN => CharClass::LocalNumber,
        _ => CharClass::Neutral,
    }
}

/// Derive the logical→visual permutation from embedding levels (UAX #9 rule
/// L2): from the highest level down to 1, reverse every maximal run at or
/// above that level.
fn visual_order(levels: &[u8]) -> Vec<usize> {
    let n = levels.len();
    let mut visual: Vec<usize> = (0..n).collect();
    let max_level = levels.iter().copied().max().unwrap_or(0);
    for level in (1..=max_level).rev() {
        let mut i = 0;
        while i < n {
            if levels[visual[i]] >= level {
                let run_start = i;
                while i < n && levels[visual[i]] >= level {
                    i += 1;
                }
                visual[run_start..i].reverse();
            } else {
                i += 1;
            }
        }
    }
    let mut order = vec![0; n];
    for (v, &logical) in visual.iter().enumerate() {
        order[logical] = v;
    }
    order
}
