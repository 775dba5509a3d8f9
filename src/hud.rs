//! HUD layout and text
//!
//! Pure helpers shared by the canvas renderer: what to draw and where.

use crate::consts::{ARENA_HEIGHT, ARENA_WIDTH};
use crate::highscores::HighScores;

/// Horizontal gap after each score digit sprite
pub const DIGIT_GAP: f64 = 5.0;
/// Top-left of the running score
pub const SCORE_ORIGIN: (f64, f64) = (10.0, 15.0);
/// Baseline of the centred timer
pub const TIMER_Y: f64 = 30.0;
/// Top-left of the ranking block
pub const PODIUM_ORIGIN: (f64, f64) = (10.0, 70.0);
pub const PODIUM_LINE_HEIGHT: f64 = 30.0;
pub const PODIUM_HEADER: &str = "スコアランキング";
/// Centre height of the next-ball preview
pub const NEXT_BALL_Y: f64 = 100.0;

/// `m:ss` from milliseconds
pub fn format_time(ms: f64) -> String {
    let total = (ms.max(0.0) / 1000.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

pub fn timer_text(ms: f64) -> String {
    format!("Time: {}", format_time(ms))
}

/// Decimal digits of a score, most significant first
pub fn score_digits(score: u64) -> Vec<u8> {
    score.to_string().bytes().map(|b| b - b'0').collect()
}

/// Ranking lines, `"{rank}. {score}pt {name}"`
pub fn podium_lines(board: &HighScores, count: usize) -> Vec<String> {
    board
        .top(count)
        .iter()
        .enumerate()
        .map(|(i, e)| format!("{}. {}pt {}", i + 1, e.score, e.name))
        .collect()
}

/// Total advance of a row of digit sprites
pub fn digits_width(widths: impl IntoIterator<Item = f64>) -> f64 {
    widths.into_iter().map(|w| w + DIGIT_GAP).sum()
}

/// Maps between the browser canvas and simulation space
///
/// The canvas is at most as wide as the arena and keeps its aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// Canvas size for a window of the given width
    pub fn for_window(window_width: f64) -> Self {
        let width = window_width.clamp(1.0, ARENA_WIDTH as f64);
        Self {
            width,
            height: width * ARENA_HEIGHT as f64 / ARENA_WIDTH as f64,
        }
    }

    /// Simulation units to canvas pixels
    pub fn scale(&self) -> f64 {
        self.width / ARENA_WIDTH as f64
    }

    /// Pointer client x to simulation x, given the canvas bounding rect
    pub fn client_to_sim_x(&self, client_x: f64, rect_left: f64, rect_width: f64) -> f32 {
        if rect_width <= 0.0 {
            return 0.0;
        }
        let canvas_x = (client_x - rect_left) * self.width / rect_width;
        (canvas_x / self.scale()) as f32
    }

    /// Draw rect `(x, y, size)` of the next-ball preview for a ball of
    /// `radius` simulation units (top right, flush with the edge)
    pub fn next_ball_rect(&self, radius: f64) -> (f64, f64, f64) {
        let r = radius * self.scale();
        (self.width - 2.0 * r, NEXT_BALL_Y - r, 2.0 * r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::HighScoreEntry;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(9_999.0), "0:09");
        assert_eq!(format_time(60_000.0), "1:00");
        assert_eq!(format_time(125_500.0), "2:05");
        assert_eq!(format_time(-10.0), "0:00");
        assert_eq!(timer_text(61_000.0), "Time: 1:01");
    }

    #[test]
    fn test_score_digits() {
        assert_eq!(score_digits(0), vec![0]);
        assert_eq!(score_digits(1204), vec![1, 2, 0, 4]);
    }

    #[test]
    fn test_podium_lines() {
        let board = HighScores::from_entries(vec![
            HighScoreEntry::new("mio", 300),
            HighScoreEntry::new("ran", 900),
            HighScoreEntry::new("kei", 500),
            HighScoreEntry::new("aoi", 100),
        ]);
        assert_eq!(
            podium_lines(&board, 3),
            vec!["1. 900pt ran", "2. 500pt kei", "3. 300pt mio"]
        );
        assert!(podium_lines(&HighScores::new(), 3).is_empty());
    }

    #[test]
    fn test_digits_width() {
        assert_eq!(digits_width([]), 0.0);
        assert_eq!(digits_width([20.0, 20.0, 18.0]), 73.0);
    }

    #[test]
    fn test_viewport_caps_width() {
        let wide = Viewport::for_window(1920.0);
        assert_eq!(wide.width, 540.0);
        assert_eq!(wide.height, 960.0);
        assert_eq!(wide.scale(), 1.0);

        let phone = Viewport::for_window(270.0);
        assert_eq!(phone.height, 480.0);
        assert_eq!(phone.scale(), 0.5);
    }

    #[test]
    fn test_pointer_mapping() {
        let phone = Viewport::for_window(270.0);
        // Canvas laid out at 270 css px starting at x=15
        assert_eq!(phone.client_to_sim_x(150.0, 15.0, 270.0), 270.0);
        // CSS-stretched to twice its backing size
        assert_eq!(phone.client_to_sim_x(285.0, 15.0, 540.0), 270.0);
        assert_eq!(phone.client_to_sim_x(10.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_next_ball_preview_scales_with_canvas() {
        let full = Viewport::for_window(540.0);
        assert_eq!(full.next_ball_rect(30.0), (480.0, NEXT_BALL_Y - 30.0, 60.0));

        // Half-width canvas draws the preview at half size
        let phone = Viewport::for_window(270.0);
        assert_eq!(phone.next_ball_rect(30.0), (240.0, NEXT_BALL_Y - 15.0, 30.0));
        assert_eq!(phone.next_ball_rect(100.0), (170.0, NEXT_BALL_Y - 50.0, 100.0));
    }
}
