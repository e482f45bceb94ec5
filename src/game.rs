use std::time::Instant;

use log::{debug, info, trace};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::scheduler::{Schedule, TimerKind};
use crate::session::{Session, SessionState};
use crate::stats::Stats;
use crate::target::{PlayArea, Point, Target};
use crate::time_series::ScorePoint;

/// What a click on the play area resolved to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    Hit { id: u64, points: u32 },
    Miss,
    /// Click arrived outside of a running session
    Ignored,
}

/// Owns one game: session, scoreboard, live targets and the timers driving them.
///
/// Time and randomness are injected. Every operation takes the current
/// `Instant` from the caller and the controller never reads the clock itself.
#[derive(Debug)]
pub struct GameController<R: Rng = StdRng> {
    session: Session,
    stats: Stats,
    targets: Vec<Target>,
    next_id: u64,
    area: PlayArea,
    schedule: Schedule,
    rng: R,
    pointer: Option<Point>,
    started_at: Option<Instant>,
    timeline: Vec<ScorePoint>,
}

impl GameController<StdRng> {
    pub fn new(area: PlayArea) -> Self {
        Self::with_rng(area, StdRng::from_entropy())
    }

    /// Reproducible spawns, used by `--seed` and tests
    pub fn with_seed(area: PlayArea, seed: u64) -> Self {
        Self::with_rng(area, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> GameController<R> {
    pub fn with_rng(area: PlayArea, rng: R) -> Self {
        Self {
            session: Session::default(),
            stats: Stats::default(),
            targets: Vec::new(),
            next_id: 0,
            area,
            schedule: Schedule::new(),
            rng,
            pointer: None,
            started_at: None,
            timeline: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.session.state
    }

    pub fn is_playing(&self) -> bool {
        self.session.state == SessionState::Playing
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn play_area(&self) -> PlayArea {
        self.area
    }

    pub fn pointer(&self) -> Option<Point> {
        self.pointer
    }

    pub fn timeline(&self) -> &[ScorePoint] {
        &self.timeline
    }

    pub fn has_pending_timers(&self) -> bool {
        self.schedule.is_armed()
    }

    /// menu/ended -> playing. Resets everything and arms the timers.
    pub fn start(&mut self, now: Instant) -> bool {
        if !self.session.state.can_transition_to(SessionState::Playing) {
            debug!("ignoring start while {}", self.session.state);
            return false;
        }

        self.session.reset_for_start();
        self.stats = Stats::default();
        self.targets.clear();
        self.next_id = 0;
        self.started_at = Some(now);
        self.timeline = vec![ScorePoint::new(0.0, 0.0)];
        self.schedule.arm(now, self.session.time_left);

        info!(
            "session started on a {}x{} play area",
            self.area.width, self.area.height
        );

        // the first opening spawn is due right away
        self.advance(now);
        true
    }

    /// playing -> ended before the countdown runs out
    pub fn end_now(&mut self, now: Instant) -> bool {
        if !self.session.state.can_transition_to(SessionState::Ended) {
            debug!("ignoring end while {}", self.session.state);
            return false;
        }

        self.finish(now);
        true
    }

    /// ended -> menu. Stats stay around for display.
    pub fn return_to_menu(&mut self) -> bool {
        if !self.session.state.can_transition_to(SessionState::Menu) {
            debug!("ignoring return to menu while {}", self.session.state);
            return false;
        }

        self.session.state = SessionState::Menu;
        true
    }

    /// Fire every timer due at or before `now`, each at its own deadline.
    /// Returns whether anything observable changed.
    pub fn advance(&mut self, now: Instant) -> bool {
        let mut changed = false;

        while let Some((due, kind)) = self.schedule.next_due() {
            if due > now {
                break;
            }

            self.schedule.rearm(kind, due, self.session.time_left);
            changed |= match kind {
                TimerKind::Expiry => self.expire_targets(due) > 0,
                TimerKind::Clock => {
                    self.tick_clock(due);
                    true
                }
                TimerKind::OpeningSpawn | TimerKind::Spawn => {
                    self.spawn_target(due);
                    true
                }
            };
        }

        changed
    }

    /// Returns the points awarded, or `None` when no such target is live
    pub fn hit_target(&mut self, id: u64, now: Instant) -> Option<u32> {
        if !self.is_playing() {
            return None;
        }

        let idx = self.targets.iter().position(|t| t.id == id)?;
        let target = self.targets.remove(idx);
        let combo = self.session.register_hit();
        let points = self.stats.record_hit(combo);

        debug!(
            "hit target {} after {}ms for {} points (combo {})",
            id,
            target.age(now).as_millis(),
            points,
            self.session.combo
        );

        Some(points)
    }

    /// Click on empty play area
    pub fn miss(&mut self) -> bool {
        if !self.is_playing() {
            return false;
        }

        self.stats.record_miss();
        self.session.register_miss();
        debug!("miss, accuracy now {}%", self.stats.accuracy);
        true
    }

    /// Resolve a click to exactly one of hit or miss.
    ///
    /// Targets drawn later sit on top, so the newest one under the pointer wins.
    pub fn click_at(&mut self, point: Point, tolerance: f64, now: Instant) -> ClickOutcome {
        if !self.is_playing() {
            return ClickOutcome::Ignored;
        }

        let topmost = self
            .targets
            .iter()
            .rev()
            .find(|t| t.contains(point, tolerance))
            .map(|t| t.id);

        match topmost {
            Some(id) => match self.hit_target(id, now) {
                Some(points) => ClickOutcome::Hit { id, points },
                None => ClickOutcome::Ignored,
            },
            None => {
                self.miss();
                ClickOutcome::Miss
            }
        }
    }

    pub fn pointer_move(&mut self, point: Point) {
        self.pointer = Some(point);
    }

    fn tick_clock(&mut self, at: Instant) {
        if self.session.time_left <= 1 {
            self.session.time_left = 0;
            self.finish(at);
            return;
        }

        self.session.time_left -= 1;
        self.schedule.restart_spawn(at, self.session.time_left);
        self.sample_score(at);
        trace!("{}s left", self.session.time_left);
    }

    fn spawn_target(&mut self, at: Instant) {
        let (x, y, size) = self.area.draw_placement(&mut self.rng);
        self.next_id += 1;

        trace!(
            "spawned target {} at ({:.0}, {:.0}) size {:.0}",
            self.next_id,
            x,
            y,
            size
        );

        self.targets.push(Target {
            id: self.next_id,
            x,
            y,
            size,
            created_at: at,
        });
    }

    /// Drop targets past their lifetime. They do not count as misses.
    fn expire_targets(&mut self, at: Instant) -> usize {
        let before = self.targets.len();
        self.targets.retain(|t| !t.is_expired(at));

        let removed = before - self.targets.len();
        if removed > 0 {
            trace!("{} target(s) expired", removed);
        }
        removed
    }

    fn finish(&mut self, at: Instant) {
        self.schedule.disarm();
        let discarded = self.targets.len();
        self.targets.clear();
        self.session.state = SessionState::Ended;
        self.sample_score(at);

        info!(
            "session ended: score {} hits {} misses {} accuracy {}% max combo {} ({} target(s) discarded)",
            self.stats.score,
            self.stats.hits,
            self.stats.misses,
            self.stats.accuracy,
            self.session.max_combo,
            discarded
        );
    }

    fn sample_score(&mut self, at: Instant) {
        let t = self
            .started_at
            .map(|start| at.saturating_duration_since(start).as_secs_f64())
            .unwrap_or_default();
        self.timeline
            .push(ScorePoint::new(t, f64::from(self.stats.score)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{spawn_period, CLOCK_PERIOD, EXPIRY_POLL};
    use crate::session::SESSION_SECS;
    use crate::target::TARGET_LIFETIME;
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn started() -> (GameController, Instant) {
        let t0 = Instant::now();
        let mut game = GameController::with_seed(PlayArea::default(), 42);
        assert!(game.start(t0));
        (game, t0)
    }

    fn first_id(game: &GameController) -> u64 {
        game.targets()[0].id
    }

    #[test]
    fn test_new_controller_is_in_menu() {
        let game = GameController::with_seed(PlayArea::default(), 1);

        assert_eq!(game.state(), SessionState::Menu);
        assert_eq!(game.session().time_left, SESSION_SECS);
        assert!(game.targets().is_empty());
        assert!(!game.has_pending_timers());
    }

    #[test]
    fn test_start_spawns_opening_targets_staggered() {
        let (mut game, t0) = started();

        assert_eq!(game.state(), SessionState::Playing);
        assert_eq!(game.targets().len(), 1);

        game.advance(t0 + ms(299));
        assert_eq!(game.targets().len(), 1);

        game.advance(t0 + ms(300));
        assert_eq!(game.targets().len(), 2);

        game.advance(t0 + ms(600));
        assert_eq!(game.targets().len(), 3);

        let ids: Vec<u64> = game.targets().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(game.targets()[1].created_at, t0 + ms(300));
    }

    #[test]
    fn test_first_hit_scores_base_points() {
        let (mut game, t0) = started();
        let id = first_id(&game);

        assert_eq!(game.hit_target(id, t0), Some(100));
        assert_eq!(game.stats().score, 100);
        assert_eq!(game.stats().hits, 1);
        assert_eq!(game.stats().misses, 0);
        assert_eq!(game.stats().accuracy, 100);
        assert_eq!(game.session().combo, 1);
        assert!(game.targets().iter().all(|t| t.id != id));
    }

    #[test]
    fn test_hit_miss_hit_sequence() {
        let (mut game, t0) = started();
        game.advance(t0 + ms(300));

        let a = first_id(&game);
        game.hit_target(a, t0 + ms(300));

        assert!(game.miss());
        assert_eq!(game.stats().misses, 1);
        assert_eq!(game.stats().accuracy, 50);
        assert_eq!(game.session().combo, 0);
        assert_eq!(game.stats().score, 100);

        let b = first_id(&game);
        assert_eq!(game.hit_target(b, t0 + ms(400)), Some(100));
        assert_eq!(game.stats().score, 200);
        assert_eq!(game.stats().hits, 2);
        assert_eq!(game.stats().accuracy, 67);
        assert_eq!(game.session().max_combo, 1);
    }

    #[test]
    fn test_combo_bonus_uses_pre_hit_streak() {
        let (mut game, t0) = started();
        game.advance(t0 + ms(600));

        let gains: Vec<u32> = (0..3)
            .map(|_| {
                let id = first_id(&game);
                game.hit_target(id, t0 + ms(600)).unwrap()
            })
            .collect();

        assert_eq!(gains, vec![100, 110, 120]);
        assert_eq!(game.stats().score, 330);
        assert_eq!(game.session().combo, 3);
        assert_eq!(game.session().max_combo, 3);
    }

    #[test]
    fn test_hit_unknown_id_is_noop() {
        let (mut game, t0) = started();

        assert_eq!(game.hit_target(999, t0), None);
        assert_eq!(game.stats().attempts(), 0);
        assert_eq!(game.targets().len(), 1);
    }

    #[test]
    fn test_expiry_removes_old_targets_without_counting_misses() {
        let (mut game, t0) = started();
        game.advance(t0 + ms(600));
        assert_eq!(game.targets().len(), 3);

        // the first opening target reaches 3000ms at exactly t0+3000
        game.advance(t0 + TARGET_LIFETIME);
        assert!(game.targets().iter().all(|t| t.id != 1));
        assert!(game
            .targets()
            .iter()
            .all(|t| !t.is_expired(t0 + TARGET_LIFETIME)));
        assert_eq!(game.stats().misses, 0);
    }

    #[test]
    fn test_no_expired_target_survives_an_expiry_tick() {
        let (mut game, t0) = started();

        let mut now = t0;
        for _ in 0..200 {
            now += EXPIRY_POLL;
            game.advance(now);
            assert!(game.targets().iter().all(|t| !t.is_expired(now)));
        }
    }

    #[test]
    fn test_expiry_preserves_order() {
        let (mut game, t0) = started();
        game.advance(t0 + ms(3100));

        let ids: Vec<u64> = game.targets().iter().map(|t| t.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_clock_ticks_and_rearms_spawn() {
        let (mut game, t0) = started();

        game.advance(t0 + CLOCK_PERIOD);
        assert_eq!(game.session().time_left, 59);

        // spawn interval restarted at the tick with the shorter period
        let before = game.targets().len();
        game.advance(t0 + CLOCK_PERIOD + spawn_period(59) - ms(1));
        assert_eq!(game.targets().len(), before);
        game.advance(t0 + CLOCK_PERIOD + spawn_period(59));
        assert_eq!(game.targets().len(), before + 1);
    }

    #[test]
    fn test_session_ends_after_sixty_ticks() {
        let (mut game, t0) = started();

        game.advance(t0 + CLOCK_PERIOD * 59);
        assert_eq!(game.state(), SessionState::Playing);
        assert_eq!(game.session().time_left, 1);

        game.advance(t0 + CLOCK_PERIOD * 60);
        assert_eq!(game.state(), SessionState::Ended);
        assert_eq!(game.session().time_left, 0);
        assert!(game.targets().is_empty());
        assert!(!game.has_pending_timers());
    }

    #[test]
    fn test_timeout_keeps_stats_and_discards_targets() {
        let (mut game, t0) = started();
        let last = t0 + CLOCK_PERIOD * 59 + ms(500);
        game.advance(last);

        let ids: Vec<u64> = game.targets().iter().map(|t| t.id).take(2).collect();
        assert_eq!(ids.len(), 2);
        for id in &ids {
            game.hit_target(*id, last);
        }
        game.miss();
        let remaining_before_end = game.targets().len();
        assert!(remaining_before_end > 0);
        let stats = *game.stats();

        game.advance(t0 + CLOCK_PERIOD * 60);
        assert_eq!(game.state(), SessionState::Ended);
        assert!(game.targets().is_empty());
        assert_eq!(*game.stats(), stats);
        assert_eq!(game.session().max_combo, 2);

        // nothing fires after the end
        assert!(!game.advance(t0 + CLOCK_PERIOD * 120));
        assert!(game.targets().is_empty());
    }

    #[test]
    fn test_end_now_disarms_and_clears() {
        let (mut game, t0) = started();
        game.advance(t0 + ms(2500));
        assert!(!game.targets().is_empty());

        assert!(game.end_now(t0 + ms(2500)));
        assert_eq!(game.state(), SessionState::Ended);
        assert!(game.targets().is_empty());
        assert_eq!(game.session().time_left, 58);
        assert!(!game.has_pending_timers());

        assert!(!game.advance(t0 + ms(10_000)));
        assert!(game.targets().is_empty());
    }

    #[test]
    fn test_illegal_transitions_are_noops() {
        let t0 = Instant::now();
        let mut game = GameController::with_seed(PlayArea::default(), 5);

        assert!(!game.end_now(t0));
        assert!(!game.return_to_menu());
        assert_eq!(game.state(), SessionState::Menu);

        game.start(t0);
        assert!(!game.start(t0 + ms(10)));
        assert!(!game.return_to_menu());
        assert_eq!(game.state(), SessionState::Playing);

        game.end_now(t0 + ms(20));
        assert!(!game.end_now(t0 + ms(30)));
        assert!(game.return_to_menu());
        assert_eq!(game.state(), SessionState::Menu);
    }

    #[test]
    fn test_input_outside_playing_is_ignored() {
        let t0 = Instant::now();
        let mut game = GameController::with_seed(PlayArea::default(), 5);

        assert!(!game.miss());
        assert_eq!(game.hit_target(1, t0), None);
        assert_eq!(
            game.click_at(Point::new(10.0, 10.0), 0.0, t0),
            ClickOutcome::Ignored
        );
        assert_eq!(game.stats().attempts(), 0);
    }

    #[test]
    fn test_restart_resets_like_fresh_start() {
        let (mut game, t0) = started();
        let id = first_id(&game);
        game.hit_target(id, t0);
        game.miss();
        game.advance(t0 + ms(5000));
        game.end_now(t0 + ms(5000));

        let t1 = t0 + ms(6000);
        assert!(game.start(t1));

        assert_eq!(game.state(), SessionState::Playing);
        assert_eq!(*game.stats(), Stats::default());
        assert_eq!(game.session().time_left, SESSION_SECS);
        assert_eq!(game.session().combo, 0);
        assert_eq!(game.session().max_combo, 0);
        assert_eq!(game.targets().len(), 1);
        assert_eq!(game.targets()[0].id, 1);
        assert_eq!(game.targets()[0].created_at, t1);
    }

    #[test]
    fn test_click_at_resolves_hit_or_miss() {
        let (mut game, t0) = started();
        let center = game.targets()[0].center();

        assert_eq!(
            game.click_at(center, 0.0, t0),
            ClickOutcome::Hit { id: 1, points: 100 }
        );
        assert_eq!(game.stats().misses, 0);

        assert_eq!(
            game.click_at(Point::new(-500.0, -500.0), 0.0, t0),
            ClickOutcome::Miss
        );
        assert_eq!(game.stats().hits, 1);
        assert_eq!(game.stats().misses, 1);
    }

    #[test]
    fn test_click_at_prefers_topmost_target() {
        let (mut game, t0) = started();
        game.advance(t0 + ms(300));

        // park the newer target right on top of the older one
        let under = game.targets[0].clone();
        game.targets[1].x = under.x;
        game.targets[1].y = under.y;
        game.targets[1].size = under.size;

        assert_eq!(
            game.click_at(under.center(), 0.0, t0 + ms(300)),
            ClickOutcome::Hit { id: 2, points: 100 }
        );
        assert_eq!(game.targets().len(), 1);
        assert_eq!(game.targets()[0].id, 1);
    }

    #[test]
    fn test_max_combo_tracks_highest_streak() {
        let (mut game, t0) = started();
        let mut observed_max = 0;
        let mut previous_max = 0;

        let mut now = t0;
        for step in 0..40u64 {
            now += ms(250);
            game.advance(now);
            if step % 4 == 3 || game.targets().is_empty() {
                game.miss();
            } else {
                let id = first_id(&game);
                game.hit_target(id, now);
            }
            observed_max = observed_max.max(game.session().combo);
            assert!(game.session().max_combo >= previous_max);
            previous_max = game.session().max_combo;
        }

        assert_eq!(game.session().max_combo, observed_max);
    }

    #[test]
    fn test_timeline_samples_each_second() {
        let (mut game, t0) = started();
        game.advance(t0 + CLOCK_PERIOD * 3);

        let ts: Vec<f64> = game.timeline().iter().map(|p| p.t).collect();
        assert_eq!(ts, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_pointer_move_is_tracked() {
        let mut game = GameController::with_seed(PlayArea::default(), 5);
        assert_eq!(game.pointer(), None);

        game.pointer_move(Point::new(3.0, 4.0));
        assert_eq!(game.pointer(), Some(Point::new(3.0, 4.0)));
    }
}
