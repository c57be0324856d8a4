//! Page layout for the report document.
//!
//! Layout is computed independently of any PDF backend: [`paginate`] turns an
//! ordered list of items into pages of placements, and the document writer
//! only has to draw what it is given.
//!
//! Coordinates are PDF points with the origin at the bottom-left corner of the
//! page. The cursor is the y coordinate at which the next image is placed.
//! After each placement the cursor moves down by `image_height + gap`; if it
//! then falls below `bottom_threshold` a new page is started and the cursor is
//! reset. The break check happens after placing, so a page always receives at
//! least one item, and the last item may be followed by an empty page.

use serde::Deserialize;

fn default_page_width() -> f32 {
    612.0
}

fn default_page_height() -> f32 {
    792.0
}

fn default_left_margin() -> f32 {
    100.0
}

fn default_image_width() -> f32 {
    400.0
}

fn default_image_height() -> f32 {
    300.0
}

fn default_gap() -> f32 {
    50.0
}

fn default_header_offset() -> f32 {
    150.0
}

fn default_header_baseline_offset() -> f32 {
    100.0
}

fn default_bottom_threshold() -> f32 {
    100.0
}

fn default_header_font_size() -> f32 {
    18.0
}

/// Page geometry in points. Defaults to US Letter with a 400x300 image slot.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageGeometry {
    #[serde(default = "default_page_width")]
    pub page_width: f32,
    #[serde(default = "default_page_height")]
    pub page_height: f32,
    #[serde(default = "default_left_margin")]
    pub left_margin: f32,
    #[serde(default = "default_image_width")]
    pub image_width: f32,
    #[serde(default = "default_image_height")]
    pub image_height: f32,
    #[serde(default = "default_gap")]
    pub gap: f32,
    /// Distance from the top of the page to the first image slot
    #[serde(default = "default_header_offset")]
    pub header_offset: f32,
    /// Distance from the top of the page to the header baseline
    #[serde(default = "default_header_baseline_offset")]
    pub header_baseline_offset: f32,
    #[serde(default = "default_bottom_threshold")]
    pub bottom_threshold: f32,
    #[serde(default = "default_header_font_size")]
    pub header_font_size: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            page_width: default_page_width(),
            page_height: default_page_height(),
            left_margin: default_left_margin(),
            image_width: default_image_width(),
            image_height: default_image_height(),
            gap: default_gap(),
            header_offset: default_header_offset(),
            header_baseline_offset: default_header_baseline_offset(),
            bottom_threshold: default_bottom_threshold(),
            header_font_size: default_header_font_size(),
        }
    }
}

impl PageGeometry {
    /// Cursor position at the top of a fresh page
    pub fn initial_cursor(&self) -> f32 {
        self.page_height - self.header_offset
    }

    /// Baseline of the header text
    pub fn header_baseline(&self) -> f32 {
        self.page_height - self.header_baseline_offset
    }

    fn step(&self) -> f32 {
        self.image_height + self.gap
    }

    /// Number of items a fresh page takes without triggering a break.
    ///
    /// The next item still lands on the same page and triggers the break
    /// after it is placed.
    pub fn items_before_break(&self) -> usize {
        if self.step() <= 0.0 {
            return usize::MAX;
        }
        let mut cursor = self.initial_cursor();
        let mut placed = 0;
        loop {
            cursor -= self.step();
            if cursor < self.bottom_threshold {
                return placed;
            }
            placed += 1;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let positive = [
            ("page_width", self.page_width),
            ("page_height", self.page_height),
            ("image_width", self.image_width),
            ("image_height", self.image_height),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("{} must be a positive number, got {}", name, value));
            }
        }
        if !(self.gap.is_finite() && self.gap >= 0.0) {
            return Err(format!("gap must be non-negative, got {}", self.gap));
        }
        if self.left_margin + self.image_width > self.page_width {
            return Err("image slot is wider than the page".to_string());
        }
        if self.initial_cursor() > self.page_height || self.initial_cursor() <= 0.0 {
            return Err("header_offset must lie within the page".to_string());
        }
        Ok(())
    }
}

/// One item placed on a page. `y` is the cursor value at placement time.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement<T> {
    pub item: T,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A page and the items placed on it, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub index: usize,
    pub placements: Vec<Placement<T>>,
}

/// Paginated document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout<T> {
    pub pages: Vec<Page<T>>,
}

impl<T> DocumentLayout<T> {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All placements in document order
    pub fn placements(&self) -> impl Iterator<Item = &Placement<T>> {
        self.pages.iter().flat_map(|p| p.placements.iter())
    }
}

/// Cursor state while laying out
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutState {
    pub cursor_y: f32,
    pub page_index: usize,
}

impl LayoutState {
    pub fn new(geometry: &PageGeometry) -> Self {
        Self {
            cursor_y: geometry.initial_cursor(),
            page_index: 0,
        }
    }

    /// Move past one placement. Returns true if a page break was triggered.
    pub fn advance(&mut self, geometry: &PageGeometry) -> bool {
        self.cursor_y -= geometry.step();
        if self.cursor_y < geometry.bottom_threshold {
            self.page_index += 1;
            self.cursor_y = geometry.initial_cursor();
            true
        } else {
            false
        }
    }
}

/// Lay out `items` in order over as many pages as needed.
///
/// Zero items yield a single page holding only the header.
pub fn paginate<T>(items: impl IntoIterator<Item = T>, geometry: &PageGeometry) -> DocumentLayout<T> {
    let mut state = LayoutState::new(geometry);
    let mut pages = vec![Page {
        index: 0,
        placements: Vec::new(),
    }];

    for item in items {
        if let Some(page) = pages.last_mut() {
            page.placements.push(Placement {
                item,
                x: geometry.left_margin,
                y: state.cursor_y,
                width: geometry.image_width,
                height: geometry.image_height,
            });
        }
        if state.advance(geometry) {
            pages.push(Page {
                index: state.page_index,
                placements: Vec::new(),
            });
        }
    }

    DocumentLayout { pages }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page_sizes(layout: &DocumentLayout<usize>) -> Vec<usize> {
        layout.pages.iter().map(|p| p.placements.len()).collect()
    }

    #[test]
    fn test_default_geometry() {
        let g = PageGeometry::default();
        assert_eq!(g.initial_cursor(), 642.0);
        assert_eq!(g.header_baseline(), 692.0);
        assert_eq!(g.items_before_break(), 1);
    }

    #[test]
    fn test_zero_items_single_header_page() {
        let layout = paginate(Vec::<usize>::new(), &PageGeometry::default());
        assert_eq!(layout.page_count(), 1);
        assert!(layout.pages[0].placements.is_empty());
    }

    #[test]
    fn test_single_item() {
        let layout = paginate(vec![0usize], &PageGeometry::default());
        assert_eq!(page_sizes(&layout), vec![1]);
        let p = &layout.pages[0].placements[0];
        assert_eq!((p.x, p.y, p.width, p.height), (100.0, 642.0, 400.0, 300.0));
    }

    #[test]
    fn test_break_after_second_item() {
        let g = PageGeometry::default();
        // 642 -> 292 -> -58: the second placement triggers the break.
        assert_eq!(page_sizes(&paginate(0..2usize, &g)), vec![2, 0]);
        assert_eq!(page_sizes(&paginate(0..3usize, &g)), vec![2, 1]);
        assert_eq!(page_sizes(&paginate(0..4usize, &g)), vec![2, 2, 0]);
        assert_eq!(page_sizes(&paginate(0..5usize, &g)), vec![2, 2, 1]);
    }

    #[test]
    fn test_items_before_break_fit_on_one_page() {
        for g in [
            PageGeometry::default(),
            PageGeometry {
                image_height: 100.0,
                gap: 20.0,
                ..PageGeometry::default()
            },
        ] {
            let p = g.items_before_break();
            let layout = paginate(0..p, &g);
            assert_eq!(layout.page_count(), 1);
            assert_eq!(page_sizes(&layout), vec![p]);
        }
    }

    #[test]
    fn test_one_more_than_items_before_break_starts_second_page() {
        for g in [
            PageGeometry::default(),
            PageGeometry {
                image_height: 100.0,
                gap: 20.0,
                ..PageGeometry::default()
            },
        ] {
            let p = g.items_before_break();
            let layout = paginate(0..p + 1, &g);
            assert_eq!(layout.page_count(), 2);
            assert_eq!(page_sizes(&layout), vec![p + 1, 0]);
        }
    }

    #[test]
    fn test_second_slot_position() {
        let layout = paginate(0..3usize, &PageGeometry::default());
        assert_eq!(layout.pages[0].placements[1].y, 292.0);
        assert_eq!(layout.pages[1].placements[0].y, 642.0);
        assert_eq!(layout.pages[1].index, 1);
    }

    #[test]
    fn test_order_preserved() {
        let layout = paginate(0..7usize, &PageGeometry::default());
        let order: Vec<usize> = layout.placements().map(|p| p.item).collect();
        assert_eq!(order, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn test_custom_geometry() {
        let g = PageGeometry {
            image_height: 100.0,
            gap: 20.0,
            ..PageGeometry::default()
        };
        // 642 - 120k < 100 first at k = 5
        assert_eq!(g.items_before_break(), 4);
        assert_eq!(page_sizes(&paginate(0..6usize, &g)), vec![5, 1]);
    }

    #[test]
    fn test_state_advance() {
        let g = PageGeometry::default();
        let mut state = LayoutState::new(&g);
        assert!(!state.advance(&g));
        assert_eq!(state.cursor_y, 292.0);
        assert!(state.advance(&g));
        assert_eq!(state, LayoutState { cursor_y: 642.0, page_index: 1 });
    }

    #[test]
    fn test_geometry_from_json_defaults() {
        let g: PageGeometry = serde_json::from_str(r#"{"image_height": 200}"#).unwrap();
        assert_eq!(g.image_height, 200.0);
        assert_eq!(g.page_width, 612.0);
    }

    #[test]
    fn test_validate_rejects_bad_geometry() {
        assert!(PageGeometry::default().validate().is_ok());
        let g = PageGeometry {
            image_height: 0.0,
            ..PageGeometry::default()
        };
        assert!(g.validate().is_err());
        let g = PageGeometry {
            image_width: 600.0,
            ..PageGeometry::default()
        };
        assert!(g.validate().is_err());
    }
}
