// engine.rs

use ratatui::Frame;

use super::{error::Result, input::GameInput};

/// Frame time of the terminal front-ends, the simulation steps once per frame.
pub const DELTA_TIME: f32 = 1.0 / 60.0;

pub trait Engine {
    /// Advances one frame. Returns true when the engine wants to quit.
    fn tick(&mut self, input: Option<GameInput>) -> Result<bool>;
    fn render_frame(&self, frame: &mut Frame);
}
