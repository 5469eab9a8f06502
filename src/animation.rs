//! Sprite-sheet animation for characters and the limb strip used on death.
//!
//! A character sheet is a grid: each row is one [`CharacterAnimation`] state
//! and each column one frame of it. Frames advance on simulation time, so a
//! paused or slowed world animates at the same pace it moves.

use crate::error::{Result, SheetAxis, SimError};
use crate::render::Rect;
use serde::{Deserialize, Serialize};

/// Animation rows of a character sheet, in sheet order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterAnimation {
    WalkUp,
    WalkTopLeft,
    WalkLeft,
    WalkBottomLeft,
    WalkDown,
    WalkBottomRight,
    WalkRight,
    WalkTopRight,
    IdleUp,
    IdleTopLeft,
    IdleLeft,
    IdleBottomLeft,
    IdleDown,
    IdleBottomRight,
    IdleRight,
    IdleTopRight,
    Thrown,
}

impl Default for CharacterAnimation {
    fn default() -> Self {
        CharacterAnimation::IdleBottomLeft
    }
}

impl CharacterAnimation {
    pub fn row(&self) -> u32 {
        *self as u32
    }

    /// Picks the walk or idle row facing `degrees` (0 = right, 90 = up).
    ///
    /// Each of the eight directions covers 45 degrees centred on its axis.
    pub fn from_heading(degrees: f64, walking: bool) -> Self {
        use CharacterAnimation::*;

        let sector = ((degrees.rem_euclid(360.0) + 22.5) / 45.0) as usize % 8;
        let (walk, idle) = match sector {
            0 => (WalkRight, IdleRight),
            1 => (WalkTopRight, IdleTopRight),
            2 => (WalkUp, IdleUp),
            3 => (WalkTopLeft, IdleTopLeft),
            4 => (WalkLeft, IdleLeft),
            5 => (WalkBottomLeft, IdleBottomLeft),
            6 => (WalkDown, IdleDown),
            _ => (WalkBottomRight, IdleBottomRight),
        };
        if walking { walk } else { idle }
    }
}

/// Validated layout of an animation sheet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationSheet {
    frame_width: u32,
    frame_height: u32,
    states: u32,
    frames_per_state: u32,
    fps: u32,
}

fn check_multiple(axis: SheetAxis, size: u32, frame: u32) -> Result<()> {
    if frame == 0 || size % frame != 0 || size == 0 {
        return Err(SimError::SheetDimension { axis, size, frame });
    }
    Ok(())
}

impl AnimationSheet {
    /// Fails unless the sheet is a whole number of frames in both directions
    pub fn new(
        sheet_width: u32,
        sheet_height: u32,
        frame_width: u32,
        frame_height: u32,
        fps: u32,
    ) -> Result<Self> {
        check_multiple(SheetAxis::Width, sheet_width, frame_width)?;
        check_multiple(SheetAxis::Height, sheet_height, frame_height)?;
        if fps == 0 {
            return Err(SimError::InvalidConfig("animation fps must be positive".to_string()));
        }
        Ok(AnimationSheet {
            frame_width,
            frame_height,
            states: sheet_height / frame_height,
            frames_per_state: sheet_width / frame_width,
            fps,
        })
    }

    pub fn frame_width(&self) -> u32 {
        self.frame_width
    }

    pub fn frame_height(&self) -> u32 {
        self.frame_height
    }

    pub fn states(&self) -> u32 {
        self.states
    }

    pub fn frames_per_state(&self) -> u32 {
        self.frames_per_state
    }

    /// Milliseconds a frame must be shown before the next one
    pub fn frame_millis(&self) -> u64 {
        1000 / self.fps as u64
    }
}

/// Current state, frame and frame clock of one animated character
#[derive(Debug, Clone)]
pub struct AnimationController {
    sheet: AnimationSheet,
    current_state: CharacterAnimation,
    frame: u32,
    elapsed_seconds: f64,
}

impl AnimationController {
    pub fn new(sheet: AnimationSheet) -> Self {
        AnimationController {
            sheet,
            current_state: CharacterAnimation::default(),
            frame: 0,
            elapsed_seconds: 0.0,
        }
    }

    /// Switches rows; the frame index carries over
    pub fn set_state(&mut self, state: CharacterAnimation) {
        self.current_state = state;
    }

    pub fn current_state(&self) -> CharacterAnimation {
        self.current_state
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Advances one frame once more than `1000 / fps` whole milliseconds
    /// have passed since the last change.
    pub fn update(&mut self, dt: f64) {
        self.elapsed_seconds += dt;
        let elapsed_millis = (self.elapsed_seconds * 1000.0) as u64;
        if elapsed_millis > self.sheet.frame_millis() {
            self.frame = (self.frame + 1) % self.sheet.frames_per_state;
            self.elapsed_seconds = 0.0;
        }
    }

    /// Region of the sheet holding the current frame
    pub fn source_rect(&self) -> Rect {
        let row = self.current_state.row().min(self.sheet.states - 1);
        Rect::new(
            (self.frame * self.sheet.frame_width) as i32,
            (row * self.sheet.frame_height) as i32,
            self.sheet.frame_width,
            self.sheet.frame_height,
        )
    }
}

/// A single row of equally sized square images (severed limbs)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageStrip {
    image_size: u32,
    count: usize,
}

impl ImageStrip {
    pub fn new(sheet_width: u32, sheet_height: u32, image_size: u32) -> Result<Self> {
        check_multiple(SheetAxis::Width, sheet_width, image_size)?;
        check_multiple(SheetAxis::Height, sheet_height, image_size)?;
        Ok(ImageStrip {
            image_size,
            count: (sheet_width / image_size) as usize,
        })
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn image(&self, index: usize) -> Result<Rect> {
        if index >= self.count {
            return Err(SimError::ImageOutOfRange {
                index,
                count: self.count,
            });
        }
        Ok(Rect::new(
            index as i32 * self.image_size as i32,
            0,
            self.image_size,
            self.image_size,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_sheet() -> AnimationSheet {
        AnimationSheet::new(200, 850, 25, 50, 5).unwrap()
    }

    #[test]
    fn test_sheet_counts_rows_and_columns() {
        let sheet = player_sheet();
        assert_eq!(sheet.states(), 17);
        assert_eq!(sheet.frames_per_state(), 8);
        assert_eq!(sheet.frame_millis(), 200);
    }

    #[test]
    fn test_sheet_rejects_bad_width() {
        let result = AnimationSheet::new(210, 850, 25, 50, 5);
        assert!(matches!(
            result,
            Err(SimError::SheetDimension { axis: SheetAxis::Width, size: 210, frame: 25 })
        ));
    }

    #[test]
    fn test_sheet_rejects_bad_height() {
        let result = AnimationSheet::new(200, 849, 25, 50, 5);
        assert!(matches!(
            result,
            Err(SimError::SheetDimension { axis: SheetAxis::Height, .. })
        ));
    }

    #[test]
    fn test_frame_advances_after_strictly_more_than_frame_time() {
        let mut anim = AnimationController::new(player_sheet());
        anim.update(0.2);
        assert_eq!(anim.frame(), 0);
        anim.update(0.002);
        assert_eq!(anim.frame(), 1);
    }

    #[test]
    fn test_frame_wraps_around() {
        let mut anim = AnimationController::new(player_sheet());
        for _ in 0..8 {
            anim.update(0.25);
        }
        assert_eq!(anim.frame(), 0);
    }

    #[test]
    fn test_source_rect_follows_state_and_frame() {
        let mut anim = AnimationController::new(player_sheet());
        assert_eq!(anim.current_state(), CharacterAnimation::IdleBottomLeft);
        anim.set_state(CharacterAnimation::WalkLeft);
        anim.update(0.25);
        assert_eq!(anim.source_rect(), Rect::new(25, 100, 25, 50));
    }

    #[test]
    fn test_from_heading_sectors() {
        use CharacterAnimation::*;
        assert_eq!(CharacterAnimation::from_heading(90.0, false), IdleUp);
        assert_eq!(CharacterAnimation::from_heading(0.0, true), WalkRight);
        assert_eq!(CharacterAnimation::from_heading(350.0, true), WalkRight);
        assert_eq!(CharacterAnimation::from_heading(135.0, false), IdleTopLeft);
        assert_eq!(CharacterAnimation::from_heading(225.0, true), WalkBottomLeft);
        assert_eq!(CharacterAnimation::from_heading(270.0, false), IdleDown);
    }

    #[test]
    fn test_image_strip_bounds() {
        let strip = ImageStrip::new(150, 25, 25).unwrap();
        assert_eq!(strip.count(), 6);
        assert_eq!(strip.image(5).unwrap(), Rect::new(125, 0, 25, 25));
        assert!(matches!(
            strip.image(6),
            Err(SimError::ImageOutOfRange { index: 6, count: 6 })
        ));
    }
}
