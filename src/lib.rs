// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod config;
pub mod game;
pub mod history;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod stats;
pub mod target;
pub mod time_series;
pub mod util;
pub mod viewport;

pub use game::{ClickOutcome, GameController};
pub use session::{Session, SessionState};
pub use stats::Stats;
pub use target::{PlayArea, Point, Target};
