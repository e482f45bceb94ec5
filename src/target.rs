use rand::Rng;
use std::time::{Duration, Instant};

/// Smallest target diameter, in play-area units
pub const MIN_TARGET_SIZE: f64 = 30.0;
/// Largest target diameter, in play-area units
pub const MAX_TARGET_SIZE: f64 = 60.0;
/// Inset kept free on every side of the play area when spawning
pub const SPAWN_MARGIN: f64 = 100.0;
/// How long a target stays clickable
pub const TARGET_LIFETIME: Duration = Duration::from_millis(3000);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Logical play surface. Origin is the top-left corner, y grows downwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayArea {
    pub width: f64,
    pub height: f64,
}

impl PlayArea {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Draw the geometry of a fresh target.
    ///
    /// The spawn range is `width - 2 * margin - size`; on areas too small for
    /// that the range goes non-positive and the draw lands at or left of the
    /// margin. That is accepted, not clamped.
    pub fn draw_placement<R: Rng>(&self, rng: &mut R) -> (f64, f64, f64) {
        let size = rng.gen_range(MIN_TARGET_SIZE..=MAX_TARGET_SIZE);
        let x = SPAWN_MARGIN + rng.gen::<f64>() * (self.width - SPAWN_MARGIN * 2.0 - size);
        let y = SPAWN_MARGIN + rng.gen::<f64>() * (self.height - SPAWN_MARGIN * 2.0 - size);
        (x, y, size)
    }
}

impl Default for PlayArea {
    fn default() -> Self {
        Self::new(1200.0, 800.0)
    }
}

/// A clickable circle. `x`/`y` is the top-left of its bounding square.
#[derive(Clone, Debug, PartialEq)]
pub struct Target {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub created_at: Instant,
}

impl Target {
    pub fn radius(&self) -> f64 {
        self.size / 2.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.radius(), self.y + self.radius())
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.age(now) >= TARGET_LIFETIME
    }

    /// Fraction of the lifetime still left, in `[0, 1]`
    pub fn remaining_fraction(&self, now: Instant) -> f64 {
        let left = TARGET_LIFETIME.saturating_sub(self.age(now));
        left.as_secs_f64() / TARGET_LIFETIME.as_secs_f64()
    }

    /// Whether `point` falls inside the circle, widened by `tolerance`
    pub fn contains(&self, point: Point, tolerance: f64) -> bool {
        self.center().distance(point) <= self.radius() + tolerance
    }
}
