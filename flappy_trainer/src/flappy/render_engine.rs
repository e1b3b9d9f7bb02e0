use std::io::{self, stdout, Stdout};

use crossterm::{
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{
        canvas::{Canvas, Circle, Context, Line as CanvasLine, Rectangle},
        *,
    },
};

use super::{
    bird::{Bird, MotionPhase},
    collision,
    game_model::{GameManager, GameState},
    pipe::PipeColor,
};

type Tui = Terminal<CrosstermBackend<Stdout>>;

#[derive(Debug)]
pub struct RenderEngine {
    terminal: Tui,
}

impl RenderEngine {
    pub fn init_render_engine() -> Result<RenderEngine, io::Error> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
        Ok(RenderEngine { terminal })
    }

    pub fn deinit_render_engine(self) -> io::Result<()> {
        disable_raw_mode()?;
        stdout().execute(LeaveAlternateScreen)?;
        Ok(())
    }

    pub fn render<F>(&mut self, render_fn: F) -> io::Result<CompletedFrame>
    where
        F: FnOnce(&mut Frame),
    {
        self.terminal.draw(|frame| render_fn(frame))
    }
}

/// Wing animation of the bird. Frames go from wing fully up to wing fully down.
struct BirdSprite;

impl BirdSprite {
    // wing tip offset below the body center, in radii
    const WING_FRAMES: [f64; 5] = [-1.0, -0.5, 0.0, 0.5, 1.0];

    fn animation_frame(phase: MotionPhase) -> usize {
        match phase {
            MotionPhase::FlappingUp => 0,
            MotionPhase::Transition => 1,
            MotionPhase::Idle => 2,
            MotionPhase::Descending => 3,
            MotionPhase::NoseDive => 4,
        }
    }

    fn draw(ctx: &mut Context, bird: &Bird, screen_height: f64, color: Color) {
        let x = bird.x() as f64;
        let y = screen_height - bird.y() as f64;
        let radius = bird.radius() as f64;
        let color = if bird.is_alive() { color } else { Color::DarkGray };
        ctx.draw(&Circle {
            x,
            y,
            radius,
            color,
        });
        let wing = Self::WING_FRAMES[Self::animation_frame(bird.phase())];
        ctx.draw(&CanvasLine {
            x1: x - 0.5 * radius,
            y1: y,
            x2: x - 1.5 * radius,
            y2: y - wing * radius,
            color,
        });
        // beak
        ctx.draw(&CanvasLine {
            x1: x + radius,
            y1: y,
            x2: x + 1.6 * radius,
            y2: y,
            color: Color::Rgb(235, 110, 40),
        });
    }
}

fn rgb(color: [u8; 3]) -> Color {
    Color::Rgb(color[0], color[1], color[2])
}

fn pipe_color(color: PipeColor) -> Color {
    match color {
        PipeColor::Green => Color::Rgb(83, 168, 52),
        PipeColor::Red => Color::Rgb(196, 58, 48),
    }
}

// screen coordinates grow downwards, canvas coordinates upwards
fn to_canvas(rect: &collision::Rect, screen_height: f64, color: Color) -> Rectangle {
    Rectangle {
        x: rect.x as f64,
        y: screen_height - rect.bottom() as f64,
        width: rect.width as f64,
        height: rect.height as f64,
        color,
    }
}

fn overlay_text(state: GameState) -> Option<&'static str> {
    match state {
        GameState::Start => Some("Press space to start"),
        GameState::Paused => Some("Paused, press p to continue"),
        GameState::GameOver => Some("Game over, press space to restart"),
        GameState::Running => None,
    }
}

impl WidgetRef for GameManager {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let config = self.config();
        let width = config.screen_width as f64;
        let height = config.screen_height as f64;
        let title = format!("Score: {}  Level: {}", self.score(), self.level());
        let block = Block::default()
            .border_style(Style::default().fg(Color::Blue))
            .borders(Borders::ALL)
            .title(Span::styled(
                title,
                Style::default()
                    .add_modifier(Modifier::BOLD)
                    .fg(Color::Rgb(255, 192, 203)),
            ))
            .title_alignment(Alignment::Center)
            .title_bottom(
                Line::from(" space: flap  p: pause  q: quit ").alignment(Alignment::Center),
            );

        Canvas::default()
            .block(block)
            .background_color(rgb(config.background_color))
            .marker(symbols::Marker::Braille)
            .x_bounds([0.0, width])
            .y_bounds([0.0, height])
            .paint(|ctx| {
                for pipe in self.pipes() {
                    let color = pipe_color(pipe.color());
                    ctx.draw(&to_canvas(&pipe.top_rect(), height, color));
                    ctx.draw(&to_canvas(&pipe.bottom_rect(), height, color));
                }
                ctx.layer();
                BirdSprite::draw(ctx, self.bird(), height, rgb(config.bird_color));
                if let Some(text) = overlay_text(self.state()) {
                    ctx.layer();
                    ctx.print(
                        width * 0.3,
                        height * 0.5,
                        Line::styled(
                            text,
                            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                        ),
                    );
                }
            })
            .render(area, buf);
    }
}

impl Widget for GameManager {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.render_ref(area, buf)
    }
}
