//! Simulated room: rectangular walls plus circular obstacles

use super::config::{CircleObstacle, SimulationConfig};

/// Static geometry of the simulated room (mm, origin in the lower-left corner)
#[derive(Debug, Clone)]
pub struct SimWorld {
    width: f32,
    height: f32,
    obstacles: Vec<CircleObstacle>,
}

impl SimWorld {
    pub fn new(width: f32, height: f32, obstacles: Vec<CircleObstacle>) -> Self {
        Self {
            width,
            height,
            obstacles,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(
            config.room_width_mm,
            config.room_height_mm,
            config.obstacles.clone(),
        )
    }

    /// Distance from (x, y) along `angle_rad` to the first surface, capped at
    /// `max_range`.
    pub fn ray_cast(&self, x: f32, y: f32, angle_rad: f32, max_range: f32) -> f32 {
        let (dy, dx) = angle_rad.sin_cos();
        let mut nearest = max_range;

        // Walls: the ray starts inside the room so exactly one crossing per axis
        if dx > f32::EPSILON {
            nearest = nearest.min((self.width - x) / dx);
        } else if dx < -f32::EPSILON {
            nearest = nearest.min(-x / dx);
        }
        if dy > f32::EPSILON {
            nearest = nearest.min((self.height - y) / dy);
        } else if dy < -f32::EPSILON {
            nearest = nearest.min(-y / dy);
        }

        for obstacle in &self.obstacles {
            let ox = x - obstacle.x_mm;
            let oy = y - obstacle.y_mm;
            let c = ox * ox + oy * oy - obstacle.radius_mm * obstacle.radius_mm;
            if c <= 0.0 {
                return 0.0;
            }
            let b = dx * ox + dy * oy;
            let disc = b * b - c;
            if disc < 0.0 {
                continue;
            }
            let t = -b - disc.sqrt();
            if t >= 0.0 {
                nearest = nearest.min(t);
            }
        }

        nearest.max(0.0)
    }

    /// Whether a disc of `radius` centred at (x, y) overlaps a wall or obstacle
    pub fn collides(&self, x: f32, y: f32, radius: f32) -> bool {
        if x < radius || y < radius || x > self.width - radius || y > self.height - radius {
            return true;
        }
        self.obstacles.iter().any(|o| {
            let dx = x - o.x_mm;
            let dy = y - o.y_mm;
            let reach = o.radius_mm + radius;
            dx * dx + dy * dy < reach * reach
        })
    }
}
