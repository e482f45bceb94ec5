/// Points for a hit before any combo bonus
pub const BASE_HIT_POINTS: u32 = 100;
/// Extra points per step of the pre-hit combo
pub const COMBO_BONUS_POINTS: u32 = 10;

/// Running scoreboard of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub score: u32,
    pub hits: u32,
    pub misses: u32,
    /// Integer percentage, see [`accuracy_percent`]
    pub accuracy: u32,
}

impl Stats {
    /// Count a hit made while `combo` was the current streak, returns the points awarded
    pub fn record_hit(&mut self, combo: u32) -> u32 {
        let points = hit_points(combo);
        self.score = self.score.saturating_add(points);
        self.hits += 1;
        self.accuracy = accuracy_percent(self.hits, self.misses);
        points
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
        self.accuracy = accuracy_percent(self.hits, self.misses);
    }

    pub fn attempts(&self) -> u32 {
        self.hits + self.misses
    }
}

/// `round(hits / (hits + misses) * 100)`, 0 before the first attempt
pub fn accuracy_percent(hits: u32, misses: u32) -> u32 {
    let attempts = hits + misses;
    if attempts == 0 {
        return 0;
    }

    ((hits as f64 / attempts as f64) * 100.0).round() as u32
}

pub fn hit_points(combo: u32) -> u32 {
    BASE_HIT_POINTS.saturating_add(combo.saturating_mul(COMBO_BONUS_POINTS))
}
