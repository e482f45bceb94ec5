use ratatui::Frame;

use crate::{
    ui::{render_menu, render_playing, render_results},
    App,
};
use flick::SessionState;

/// A UI Screen boundary: responsible for rendering one session state
pub trait Screen {
    fn render(&self, app: &mut App, f: &mut Frame);
}

pub struct MenuScreen;

impl Screen for MenuScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        // no play rectangle on screen, clicks have nothing to land on
        app.viewport = None;
        render_menu(app, f);
    }
}

/// HUD plus the live play area
pub struct PlayingScreen;

impl Screen for PlayingScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        render_playing(app, f);
    }
}

pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        app.viewport = None;
        render_results(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: SessionState) -> Box<dyn Screen> {
    match state {
        SessionState::Menu => Box::new(MenuScreen),
        SessionState::Playing => Box::new(PlayingScreen),
        SessionState::Ended => Box::new(ResultsScreen),
    }
}
