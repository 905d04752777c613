use crate::sequence::{SequenceConfig, SPEED_BOUNDS};

/// Fraction of the scrollable distance already travelled, in `[0, 1]`.
///
/// Pages that cannot scroll (`scroll_height <= viewport_height`) report `0.0`
/// rather than dividing by zero.
pub fn scroll_fraction(scroll_top: f64, scroll_height: f64, viewport_height: f64) -> f64 {
    let max_scroll = scroll_height - viewport_height;

    if !(max_scroll > 0.0) || !scroll_top.is_finite() {
        return 0.0;
    }

    (scroll_top / max_scroll).clamp(0.0, 1.0)
}

/// Maps a fraction to a 1-based frame index. Rounds up, so the top of the page
/// lands on frame 1 and the bottom on the last frame.
pub fn frame_for_fraction(fraction: f64, frame_count: u32) -> u32 {
    let frame_count = frame_count.max(1);
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };

    let index = (fraction * f64::from(frame_count)).ceil() as u32;
    index.clamp(1, frame_count)
}

pub fn frame_for_scroll(
    scroll_top: f64,
    scroll_height: f64,
    viewport_height: f64,
    frame_count: u32,
) -> u32 {
    frame_for_fraction(
        scroll_fraction(scroll_top, scroll_height, viewport_height),
        frame_count,
    )
}

pub fn interval_ms_for_speed(speed: u8) -> u32 {
    let speed = u32::from(speed.clamp(SPEED_BOUNDS.0, SPEED_BOUNDS.1));
    1_000 / (speed * 2)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCommand {
    TogglePlayback,
    SpeedUp,
    SpeedDown,
}

impl KeyCommand {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            " " | "Spacebar" => Some(Self::TogglePlayback),
            "ArrowUp" => Some(Self::SpeedUp),
            "ArrowDown" => Some(Self::SpeedDown),
            _ => None,
        }
    }
}

/// Everything the selector mutates between ticks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnimationState {
    frame: u32,
    frame_count: u32,
    playing: bool,
    speed: u8,
    fixed_interval_ms: Option<u32>,
    page_hidden: bool,
    offscreen: bool,
}

impl AnimationState {
    pub fn new(frame_count: u32, speed: u8, fixed_interval_ms: Option<u32>) -> Self {
        Self {
            frame: 1,
            frame_count: frame_count.max(1),
            playing: false,
            speed: speed.clamp(SPEED_BOUNDS.0, SPEED_BOUNDS.1),
            fixed_interval_ms,
            page_hidden: false,
            offscreen: false,
        }
    }

    pub fn from_config(config: &SequenceConfig) -> Self {
        Self::new(config.frame_count, config.speed, config.fixed_interval_ms)
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    /// Whether a timer tick should currently advance the sequence.
    pub fn should_tick(&self) -> bool {
        self.playing && !self.page_hidden && !self.offscreen
    }

    pub fn interval_ms(&self) -> u32 {
        self.fixed_interval_ms
            .unwrap_or_else(|| interval_ms_for_speed(self.speed))
    }

    /// Moves one frame forward, wrapping from the last frame back to 1.
    pub fn advance(&mut self) -> u32 {
        self.frame = if self.frame >= self.frame_count {
            1
        } else {
            self.frame + 1
        };
        self.frame
    }

    pub fn seek(&mut self, index: u32) -> u32 {
        self.frame = index.clamp(1, self.frame_count);
        self.frame
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn toggle(&mut self) -> bool {
        self.playing = !self.playing;
        self.playing
    }

    pub fn set_speed(&mut self, speed: u8) -> u8 {
        self.speed = speed.clamp(SPEED_BOUNDS.0, SPEED_BOUNDS.1);
        self.speed
    }

    pub fn adjust_speed(&mut self, delta: i8) -> u8 {
        let next = i16::from(self.speed) + i16::from(delta);
        let next = next.clamp(i16::from(SPEED_BOUNDS.0), i16::from(SPEED_BOUNDS.1));
        self.set_speed(next as u8)
    }

    pub fn set_page_hidden(&mut self, hidden: bool) {
        self.page_hidden = hidden;
    }

    pub fn set_offscreen(&mut self, offscreen: bool) {
        self.offscreen = offscreen;
    }

    pub fn apply(&mut self, command: KeyCommand) {
        match command {
            KeyCommand::TogglePlayback => {
                self.toggle();
            }
            KeyCommand::SpeedUp => {
                self.adjust_speed(1);
            }
            KeyCommand::SpeedDown => {
                self.adjust_speed(-1);
            }
        }
    }
}

/// Placement that fills the target rectangle while keeping the image's aspect
/// ratio, like CSS `object-fit: cover`. Offsets are negative on the cropped axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoverFit {
    pub offset_x: f64,
    pub offset_y: f64,
    pub draw_width: f64,
    pub draw_height: f64,
}

impl CoverFit {
    pub fn compute(
        canvas_width: f64,
        canvas_height: f64,
        image_width: f64,
        image_height: f64,
    ) -> Option<Self> {
        if !(canvas_width > 0.0 && canvas_height > 0.0 && image_width > 0.0 && image_height > 0.0)
        {
            return None;
        }

        let canvas_ratio = canvas_width / canvas_height;
        let image_ratio = image_width / image_height;

        let fit = if canvas_ratio > image_ratio {
            let draw_height = canvas_width / image_ratio;
            Self {
                offset_x: 0.0,
                offset_y: (canvas_height - draw_height) / 2.0,
                draw_width: canvas_width,
                draw_height,
            }
        } else {
            let draw_width = canvas_height * image_ratio;
            Self {
                offset_x: (canvas_width - draw_width) / 2.0,
                offset_y: 0.0,
                draw_width,
                draw_height: canvas_height,
            }
        };

        Some(fit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 0.05,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn scroll_index_stays_in_range_across_the_page() {
        let scroll_height = 5_000.0;
        let viewport = 800.0;
        let max_scroll = scroll_height - viewport;

        let mut scroll_top = 0.0;
        while scroll_top <= max_scroll {
            let index = frame_for_scroll(scroll_top, scroll_height, viewport, 240);
            assert!((1..=240).contains(&index), "index {index} at {scroll_top}");
            scroll_top += 7.3;
        }
    }

    #[test]
    fn scroll_extremes_map_to_first_and_last_frame() {
        assert_eq!(frame_for_scroll(0.0, 3_000.0, 1_000.0, 240), 1);
        assert_eq!(frame_for_scroll(2_000.0, 3_000.0, 1_000.0, 240), 240);
    }

    #[test]
    fn short_page_maps_to_first_frame_without_nan() {
        assert_eq!(scroll_fraction(0.0, 600.0, 800.0), 0.0);
        assert_eq!(scroll_fraction(10.0, 800.0, 800.0), 0.0);
        assert_eq!(frame_for_scroll(10.0, 800.0, 800.0, 240), 1);
    }

    #[test]
    fn overscroll_is_clamped() {
        assert_eq!(frame_for_scroll(-120.0, 3_000.0, 1_000.0, 240), 1);
        assert_eq!(frame_for_scroll(2_400.0, 3_000.0, 1_000.0, 240), 240);
        assert_eq!(frame_for_fraction(f64::NAN, 240), 1);
    }

    #[test]
    fn scroll_index_rounds_up() {
        // 1% of 240 frames is 2.4, which lands on frame 3.
        assert_eq!(frame_for_scroll(20.0, 3_000.0, 1_000.0, 240), 3);
        assert_eq!(frame_for_fraction(0.5, 240), 120);
    }

    #[test]
    fn timer_sequence_wraps_without_zero_or_overflow() {
        let mut state = AnimationState::new(4, 5, None);
        let sequence: Vec<u32> = (0..9).map(|_| state.advance()).collect();

        assert_eq!(sequence, vec![2, 3, 4, 1, 2, 3, 4, 1, 2]);
    }

    #[test]
    fn single_frame_sequence_stays_on_frame_one() {
        let mut state = AnimationState::new(1, 5, None);

        assert_eq!(state.advance(), 1);
        assert_eq!(state.advance(), 1);
    }

    #[test]
    fn speed_maps_to_interval() {
        assert_eq!(interval_ms_for_speed(10), 50);
        assert_eq!(interval_ms_for_speed(1), 500);
        assert_eq!(interval_ms_for_speed(0), 500);
        assert_eq!(interval_ms_for_speed(200), 50);
    }

    #[test]
    fn fixed_interval_overrides_speed() {
        let mut state = AnimationState::new(240, 10, Some(33));
        assert_eq!(state.interval_ms(), 33);

        state.set_speed(1);
        assert_eq!(state.interval_ms(), 33);
    }

    #[test]
    fn keyboard_commands_drive_state() {
        let mut state = AnimationState::new(240, 9, None);

        state.apply(KeyCommand::from_key(" ").expect("space is bound"));
        assert!(state.is_playing());

        state.apply(KeyCommand::SpeedUp);
        state.apply(KeyCommand::SpeedUp);
        assert_eq!(state.speed(), 10);

        for _ in 0..15 {
            state.apply(KeyCommand::SpeedDown);
        }
        assert_eq!(state.speed(), 1);

        assert_eq!(KeyCommand::from_key("Enter"), None);
    }

    #[test]
    fn hidden_page_or_offscreen_target_suspends_ticks() {
        let mut state = AnimationState::new(240, 5, None);
        state.play();
        assert!(state.should_tick());

        state.set_page_hidden(true);
        assert!(!state.should_tick());
        assert!(state.is_playing());

        state.set_page_hidden(false);
        state.set_offscreen(true);
        assert!(!state.should_tick());

        state.set_offscreen(false);
        assert!(state.should_tick());

        state.pause();
        assert!(!state.should_tick());
    }

    #[test]
    fn seek_clamps_to_sequence() {
        let mut state = AnimationState::new(240, 5, None);

        assert_eq!(state.seek(0), 1);
        assert_eq!(state.seek(241), 240);
        assert_eq!(state.seek(37), 37);
    }

    #[test]
    fn cover_fit_crops_horizontally_for_wide_images() {
        let fit = CoverFit::compute(800.0, 600.0, 1_600.0, 900.0).expect("valid dimensions");

        assert_close(fit.draw_width, 1_066.7);
        assert_close(fit.draw_height, 600.0);
        assert_close(fit.offset_x, -133.3);
        assert_eq!(fit.offset_y, 0.0);
    }

    #[test]
    fn cover_fit_crops_vertically_for_tall_images() {
        let fit = CoverFit::compute(1_600.0, 900.0, 800.0, 800.0).expect("valid dimensions");

        assert_close(fit.draw_width, 1_600.0);
        assert_close(fit.draw_height, 1_600.0);
        assert_eq!(fit.offset_x, 0.0);
        assert_close(fit.offset_y, -350.0);
    }

    #[test]
    fn cover_fit_rejects_empty_dimensions() {
        assert!(CoverFit::compute(800.0, 600.0, 0.0, 900.0).is_none());
        assert!(CoverFit::compute(0.0, 600.0, 1_600.0, 900.0).is_none());
    }
}
