// File: crates/cml-core/src/types.rs
// Summary: Canvas size constants and the plot margins that hold axis labels and the title.

/// Default canvas width in pixels.
pub const WIDTH: i32 = 800;
/// Default canvas height in pixels.
pub const HEIGHT: i32 = 600;

/// Space between the canvas edge and the plot frame, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Insets {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl Insets {
    pub const fn new(left: u32, right: u32, top: u32, bottom: u32) -> Self {
        Self { left, right, top, bottom }
    }
}

/// Price labels on the left, time labels below, title above.
impl Default for Insets {
    fn default() -> Self { Self::new(60, 20, 40, 60) }
}
