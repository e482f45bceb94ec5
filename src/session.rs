/// Length of one session in seconds
pub const SESSION_SECS: u32 = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum_macros::Display)]
pub enum SessionState {
    #[default]
    Menu,
    Playing,
    Ended,
}

impl SessionState {
    /// menu -> playing -> ended -> {menu | playing}; nothing else is legal
    pub fn can_transition_to(self, next: SessionState) -> bool {
        matches!(
            (self, next),
            (SessionState::Menu, SessionState::Playing)
                | (SessionState::Playing, SessionState::Ended)
                | (SessionState::Ended, SessionState::Playing)
                | (SessionState::Ended, SessionState::Menu)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub state: SessionState,
    pub time_left: u32,
    pub combo: u32,
    pub max_combo: u32,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            state: SessionState::Menu,
            time_left: SESSION_SECS,
            combo: 0,
            max_combo: 0,
        }
    }
}

impl Session {
    pub fn reset_for_start(&mut self) {
        self.state = SessionState::Playing;
        self.time_left = SESSION_SECS;
        self.combo = 0;
        self.max_combo = 0;
    }

    /// Extend the streak, returning the combo as it was before this hit
    pub fn register_hit(&mut self) -> u32 {
        let before = self.combo;
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        before
    }

    pub fn register_miss(&mut self) {
        self.combo = 0;
    }

    pub fn seconds_played(&self) -> u32 {
        SESSION_SECS.saturating_sub(self.time_left)
    }
}
