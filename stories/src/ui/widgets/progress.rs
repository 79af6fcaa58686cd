//! Segmented progress bar across the top of the viewer.
//!
//! One segment per story in the playlist: finished stories are filled,
//! the current story is filled up to its progress, later ones are empty.

use ratatui::{buffer::Buffer, layout::Rect, style::Style, widgets::Widget};

use crate::ui::theme::StoryTheme;

pub struct ProgressBarWidget<'a> {
    segments: usize,
    current: usize,
    percent: f64,
    theme: &'a StoryTheme,
}

impl<'a> ProgressBarWidget<'a> {
    pub fn new(segments: usize, current: usize, percent: f64, theme: &'a StoryTheme) -> Self {
        Self {
            segments,
            current,
            percent: percent.clamp(0.0, 100.0),
            theme,
        }
    }
}

/// Column ranges `[start, end)` of each segment, with one blank column
/// between neighbours when space allows.
pub fn segment_bounds(width: u16, segments: usize) -> Vec<(u16, u16)> {
    if segments == 0 || width == 0 {
        return Vec::new();
    }
    let n = segments as u32;
    let gap: u32 = if u32::from(width) >= n * 2 { 1 } else { 0 };
    let usable = u32::from(width).saturating_sub(gap * (n - 1));

    (0..n)
        .map(|i| {
            let start = usable * i / n + gap * i;
            let end = usable * (i + 1) / n + gap * i;
            (start as u16, end as u16)
        })
        .collect()
}

impl Widget for ProgressBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        let y = area.y;
        for (i, (start, end)) in segment_bounds(area.width, self.segments)
            .into_iter()
            .enumerate()
        {
            let len = end.saturating_sub(start);
            let filled = if i < self.current {
                len
            } else if i == self.current {
                (f64::from(len) * self.percent / 100.0).round() as u16
            } else {
                0
            };

            for offset in 0..len {
                let (symbol, color) = if offset < filled {
                    let color = if i == self.current {
                        self.theme.progress_active
                    } else {
                        self.theme.progress_done
                    };
                    ("━", color)
                } else {
                    ("─", self.theme.progress_pending)
                };
                buf.set_string(area.x + start + offset, y, symbol, Style::default().fg(color));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_cover_width() {
        let bounds = segment_bounds(32, 3);
        assert_eq!(bounds.len(), 3);
        assert_eq!(bounds[0].0, 0);
        assert_eq!(bounds[2].1, 32);
        // Gaps between segments
        assert!(bounds.windows(2).all(|w| w[1].0 == w[0].1 + 1));
    }

    #[test]
    fn test_narrow_area_drops_gaps() {
        let bounds = segment_bounds(5, 5);
        assert_eq!(bounds, vec![(0, 1), (1, 2), (2, 3), (3, 4), (4, 5)]);
        assert!(segment_bounds(0, 3).is_empty());
        assert!(segment_bounds(10, 0).is_empty());
    }

    #[test]
    fn test_current_segment_partially_filled() {
        let theme = StoryTheme::default();
        let area = Rect::new(0, 0, 21, 1);
        let mut buf = Buffer::empty(area);
        ProgressBarWidget::new(2, 1, 50.0, &theme).render(area, &mut buf);

        // Segments are columns 0..10 and 11..21.
        assert_eq!(buf[(0, 0)].symbol(), "━");
        assert_eq!(buf[(10, 0)].symbol(), " ");
        assert_eq!(buf[(11, 0)].symbol(), "━");
        assert_eq!(buf[(15, 0)].symbol(), "━");
        assert_eq!(buf[(16, 0)].symbol(), "─");
        assert_eq!(buf[(20, 0)].symbol(), "─");
    }
}
