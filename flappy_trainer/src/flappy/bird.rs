// bird.rs

use super::{collision::Rect, config::GameConfig};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionPhase {
    Idle,
    FlappingUp,
    Transition,
    Descending,
    NoseDive,
}

impl MotionPhase {
    pub const FLAPPING_UP_THRESHOLD: f32 = -5.0;
    pub const NOSE_DIVE_THRESHOLD: f32 = 6.0;

    pub fn from_velocity(velocity: f32) -> Self {
        if velocity < Self::FLAPPING_UP_THRESHOLD {
            MotionPhase::FlappingUp
        } else if velocity < 0.0 {
            MotionPhase::Transition
        } else if velocity > Self::NOSE_DIVE_THRESHOLD {
            MotionPhase::NoseDive
        } else if velocity > 0.0 {
            MotionPhase::Descending
        } else {
            MotionPhase::Idle
        }
    }
}

/// The player body. Only moves vertically; velocity is in pixels per tick.
#[derive(Clone, Debug)]
pub struct Bird {
    x: f32,
    y: f32,
    velocity: f32,
    radius: f32,
    alive: bool,
    phase: MotionPhase,
    start_y: f32,
    gravity: f32,
    flap_force: f32,
    flap_decay: f32,
}

impl Bird {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            x: config.bird_start_x,
            y: config.bird_start_y,
            velocity: 0.0,
            radius: config.bird_radius,
            alive: true,
            phase: MotionPhase::Idle,
            start_y: config.bird_start_y,
            gravity: config.bird_gravity,
            flap_force: config.bird_flap_force,
            flap_decay: config.bird_flap_decay,
        }
    }

    pub fn update(&mut self, delta_time: f32) {
        if !self.alive {
            return;
        }
        if self.phase == MotionPhase::FlappingUp {
            self.velocity *= self.flap_decay;
        }
        self.velocity += self.gravity * delta_time;
        self.y += self.velocity;
        self.phase = MotionPhase::from_velocity(self.velocity);
    }

    /// Replaces the velocity, flaps don't stack.
    pub fn flap(&mut self) {
        if !self.alive {
            return;
        }
        self.velocity = -self.flap_force;
        self.phase = MotionPhase::FlappingUp;
    }

    pub fn die(&mut self) {
        self.alive = false;
    }

    pub fn reset(&mut self) {
        self.y = self.start_y;
        self.velocity = 0.0;
        self.alive = true;
        self.phase = MotionPhase::Idle;
    }

    pub fn rect(&self) -> Rect {
        Rect::new(
            self.x - self.radius,
            self.y - self.radius,
            2.0 * self.radius,
            2.0 * self.radius,
        )
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn phase(&self) -> MotionPhase {
        self.phase
    }

    #[cfg(test)]
    pub fn set_y(&mut self, y: f32) {
        self.y = y;
    }

    #[cfg(test)]
    pub fn set_velocity(&mut self, velocity: f32) {
        self.velocity = velocity;
    }
}
