pub mod charting;
pub mod screen;

use std::time::Instant;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle},
        Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap,
    },
    Frame,
};

use crate::App;
use flick::viewport::Viewport;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

pub fn draw(app: &mut App, f: &mut Frame) {
    screen::current_screen(app.game.state()).render(app, f);
}

/// Split the frame into the HUD row and the bordered play block
pub fn playing_layout(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(area);
    (chunks[0], chunks[1])
}

/// Targets fade green -> yellow -> red as they near expiry
fn lifetime_color(remaining: f64) -> Color {
    if remaining > 2.0 / 3.0 {
        Color::Green
    } else if remaining > 1.0 / 3.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

pub fn render_playing(app: &mut App, f: &mut Frame) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_bold_style = bold_style.add_modifier(Modifier::DIM);

    let (hud_area, play_block_area) = playing_layout(f.area());
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(" flick ", dim_bold_style));

    let play = app.game.play_area();
    app.viewport = Some(Viewport::new(block.inner(play_block_area), play));

    let stats = app.game.stats();
    let session = app.game.session();
    let time_style = if session.time_left <= 10 {
        bold_style.fg(Color::Red)
    } else {
        bold_style
    };

    let hud = Paragraph::new(Line::from(vec![
        Span::styled(format!("score {}", stats.score), bold_style.fg(Color::Cyan)),
        Span::raw("   "),
        Span::styled(format!("{}% acc", stats.accuracy), bold_style),
        Span::raw("   "),
        Span::styled(
            format!("combo {} (max {})", session.combo, session.max_combo),
            bold_style.fg(Color::Magenta),
        ),
        Span::raw("   "),
        Span::styled(format!("{}s", session.time_left), time_style),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(hud, hud_area);

    let now = Instant::now();
    let game = &app.game;
    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([0.0, play.width])
        .y_bounds([0.0, play.height])
        .paint(|ctx| {
            // canvas y grows upwards, the play area's grows downwards
            for target in game.targets() {
                let center = target.center();
                ctx.draw(&Circle {
                    x: center.x,
                    y: play.height - center.y,
                    radius: target.radius(),
                    color: lifetime_color(target.remaining_fraction(now)),
                });
            }
            if let Some(pointer) = game.pointer() {
                ctx.print(
                    pointer.x,
                    play.height - pointer.y,
                    Span::styled("+", Style::default().fg(Color::White)),
                );
            }
        });
    f.render_widget(canvas, play_block_area);
}

pub fn render_menu(app: &mut App, f: &mut Frame) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let mut lines = vec![
        Line::from(Span::styled("flick", bold_style.fg(Color::Cyan))),
        Line::from(""),
        Line::from("click the targets before they vanish"),
        Line::from("hits score 100 plus 10 for every hit in your current streak"),
        Line::from(""),
        Line::from(Span::styled("(enter) start / (q)uit", italic_style)),
    ];

    let summary = &app.history_summary;
    if summary.sessions > 0 {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(
                "{} sessions recorded   best {}   avg {:.0}% acc",
                summary.sessions,
                summary.best_score,
                summary.mean_accuracy.unwrap_or_default()
            ),
            Style::default().fg(Color::Gray),
        )));
    }

    let height = lines.len() as u16;
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(area.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    let menu = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(menu, chunks[1]);
}

pub fn render_results(app: &mut App, f: &mut Frame) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let magenta_style = Style::default().fg(Color::Magenta);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // combo
            Constraint::Length(1), // history
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(f.area());

    let timeline = app.game.timeline();
    let (overall_duration, highest_score) = charting::compute_chart_params(timeline);
    let tuples: Vec<(f64, f64)> = timeline.iter().map(|p| (*p).into()).collect();
    let datasets = vec![Dataset::default()
        .marker(Marker::Braille)
        .style(magenta_style)
        .graph_type(GraphType::Line)
        .data(&tuples)];

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([0.0, overall_duration])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(overall_duration), bold_style),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("score")
                .bounds([0.0, highest_score])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(highest_score), bold_style),
                ]),
        );
    f.render_widget(chart, chunks[0]);

    let stats = app.game.stats();
    let summary_line = Paragraph::new(Span::styled(
        format!(
            "score {}   {} hits   {} misses   {}% acc",
            stats.score, stats.hits, stats.misses, stats.accuracy
        ),
        bold_style,
    ))
    .alignment(Alignment::Center);
    f.render_widget(summary_line, chunks[1]);

    let combo_line = Paragraph::new(Span::styled(
        format!("max combo {}", app.game.session().max_combo),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center);
    f.render_widget(combo_line, chunks[2]);

    if app.history.is_some() && app.history_summary.sessions > 0 {
        let history_line = Paragraph::new(Span::styled(
            format!(
                "best of {} sessions: {}",
                app.history_summary.sessions, app.history_summary.best_score
            ),
            Style::default().fg(Color::Gray),
        ))
        .alignment(Alignment::Center);
        f.render_widget(history_line, chunks[3]);
    }

    let legend = Paragraph::new(Span::styled("(r)etry / (m)enu / (q)uit", italic_style));
    f.render_widget(legend, chunks[5]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Flow, App};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use flick::config::Config;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    fn render(app: &mut App, width: u16, height: u16) -> String {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(app, f)).unwrap();

        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    fn press(app: &mut App, code: KeyCode, now: Instant) {
        assert_eq!(
            app.handle_key(KeyEvent::new(code, KeyModifiers::NONE), now),
            Flow::Continue
        );
    }

    #[test]
    fn test_lifetime_color() {
        assert_eq!(lifetime_color(1.0), Color::Green);
        assert_eq!(lifetime_color(0.5), Color::Yellow);
        assert_eq!(lifetime_color(0.1), Color::Red);
    }

    #[test]
    fn test_playing_layout_reserves_hud_row() {
        let (hud, play) = playing_layout(Rect::new(0, 0, 80, 24));
        assert_eq!(hud, Rect::new(0, 0, 80, 1));
        assert_eq!(play, Rect::new(0, 1, 80, 23));
    }

    #[test]
    fn test_menu_screen() {
        let mut app = App::new(Config::default(), Some(1), None);
        let rendered = render(&mut app, 80, 24);

        assert!(rendered.contains("flick"));
        assert!(rendered.contains("(enter) start"));
        assert!(app.viewport.is_none());
    }

    #[test]
    fn test_playing_screen_draws_hud_and_targets() {
        let mut app = App::new(Config::default(), Some(1), None);
        press(&mut app, KeyCode::Enter, Instant::now());

        let rendered = render(&mut app, 80, 24);

        assert!(rendered.contains("score 0"));
        assert!(rendered.contains("60s"));
        assert!(rendered
            .chars()
            .any(|c| ('\u{2801}'..='\u{28FF}').contains(&c)));

        // bordered block leaves one cell on each side, below the HUD row
        let viewport = app.viewport.expect("viewport recorded while playing");
        assert_eq!(viewport.rect, Rect::new(1, 2, 78, 21));
    }

    #[test]
    fn test_results_screen() {
        let mut app = App::new(Config::default(), Some(1), None);
        let t0 = Instant::now();
        press(&mut app, KeyCode::Enter, t0);

        let center = app.game.targets()[0].center();
        app.game.click_at(center, 0.0, t0);
        app.on_tick(t0 + Duration::from_secs(60));

        let rendered = render(&mut app, 100, 30);

        assert!(rendered.contains("score 100"));
        assert!(rendered.contains("max combo 1"));
        assert!(rendered.contains("(r)etry"));
        assert!(app.viewport.is_none());
    }
}
