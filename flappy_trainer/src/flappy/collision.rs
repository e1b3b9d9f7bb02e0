// collision.rs

use super::{bird::Bird, pipe::Pipe};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Strict overlap, rectangles that only share an edge don't intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

pub fn hits_boundary(bird: &Bird, screen_height: f32) -> bool {
    bird.y() - bird.radius() <= 0.0 || bird.y() + bird.radius() >= screen_height
}

pub fn hits_pipe(bird_rect: &Rect, pipes: &[Pipe]) -> bool {
    pipes.iter().any(|pipe| pipe.collides_with(bird_rect))
}

/// Marks every unpassed pipe whose trailing edge is strictly behind `bird_x` as passed and
/// returns how many were marked.
pub fn score_passed(pipes: &mut [Pipe], bird_x: f32) -> u32 {
    let mut scored = 0;
    for pipe in pipes.iter_mut() {
        if !pipe.passed() && pipe.trailing_edge() < bird_x {
            pipe.mark_passed();
            scored += 1;
        }
    }
    scored
}

#[cfg(test)]
mod tests {
    use crate::flappy::{config::GameConfig, pipe::PipeColor};

    use super::*;

    fn config() -> GameConfig {
        GameConfig {
            screen_width: 800,
            screen_height: 600,
            pipe_width: 50,
            ..GameConfig::default()
        }
    }

    fn pipe(x: f32, gap_center: u32, gap_height: u32) -> Pipe {
        Pipe::new(&config(), PipeColor::Green, x, gap_center, gap_height).unwrap()
    }

    #[test]
    fn test_touching_edges_dont_collide() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        let c = Rect::new(9.0, 9.0, 10.0, 10.0);
        assert!(a.intersects(&c));
    }

    #[test]
    fn test_bird_against_top_pipe() {
        let pipes = [pipe(100.0, 200, 150)];
        assert!(hits_pipe(&Rect::new(110.0, 0.0, 20.0, 20.0), &pipes));
    }

    #[test]
    fn test_bird_inside_gap() {
        let pipes = [pipe(100.0, 200, 150)];
        assert!(!hits_pipe(&Rect::new(110.0, 190.0, 20.0, 20.0), &pipes));
    }

    #[test]
    fn test_bird_against_bottom_pipe() {
        let pipes = [pipe(100.0, 200, 150)];
        assert!(hits_pipe(&Rect::new(110.0, 280.0, 20.0, 20.0), &pipes));
    }

    #[test]
    fn test_boundaries() {
        let config = config();
        let mut bird = Bird::new(&config);
        assert!(!hits_boundary(&bird, 600.0));
        bird.set_y(bird.radius());
        assert!(hits_boundary(&bird, 600.0));
        bird.set_y(600.0 - bird.radius());
        assert!(hits_boundary(&bird, 600.0));
        bird.set_y(600.0 - bird.radius() - 0.5);
        assert!(!hits_boundary(&bird, 600.0));
    }

    #[test]
    fn test_each_pipe_scores_once() {
        let mut pipes = vec![pipe(10.0, 300, 150), pipe(20.0, 300, 150), pipe(400.0, 300, 150)];
        // trailing edges at 60 and 70 are behind the bird, 450 is not
        assert_eq!(score_passed(&mut pipes, 100.0), 2);
        assert_eq!(score_passed(&mut pipes, 100.0), 0);
        assert!(pipes[0].passed() && pipes[1].passed() && !pipes[2].passed());
    }

    #[test]
    fn test_trailing_edge_must_be_strictly_behind() {
        let mut pipes = vec![pipe(50.0, 300, 150)];
        assert_eq!(score_passed(&mut pipes, 100.0), 0);
        assert_eq!(score_passed(&mut pipes, 100.5), 1);
    }
}
