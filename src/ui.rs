use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::App;
use crate::game::{Phase, BLOCK_SIZE, FIELD_HEIGHT, FIELD_WIDTH, PLAYER_SIZE};

const OBSTACLE_COLOR: Color = Color::Rgb(255, 60, 60);
const POWERUP_COLOR: Color = Color::Rgb(0, 255, 255);
const PLAYER_COLOR: Color = Color::Rgb(0, 220, 0);
const SHIELDED_COLOR: Color = Color::Rgb(255, 255, 0);

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Status bar
            Constraint::Min(8),    // Play field
            Constraint::Length(1), // Help
        ])
        .split(frame.area());

    render_status(frame, app, chunks[0]);
    render_field(frame, app, chunks[1]);
    render_help(frame, app, chunks[2]);

    match app.game.phase {
        Phase::GameOver => {
            let message = format!("Score: {}! Press R to restart", app.game.score);
            render_overlay(frame, chunks[1], " GAME OVER ", &message);
        }
        Phase::Paused => render_overlay(frame, chunks[1], " PAUSED ", "Press P to resume"),
        Phase::Playing => {}
    }
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let status = Line::from(vec![
        Span::styled(
            format!(" Score: {:05} ", app.game.score),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("│ ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("High: {:05} ", app.scores.best()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled("│ ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            "♥ ".repeat(app.game.lives as usize),
            Style::default().fg(Color::Red),
        ),
    ]);
    frame.render_widget(Paragraph::new(status), area);
}

fn render_field(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(100, 160, 220)))
        .title(" Cube Dodge ")
        .title_style(
            Style::default()
                .fg(Color::Rgb(140, 200, 255))
                .add_modifier(Modifier::BOLD),
        );
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let w = inner.width as usize;
    let h = inner.height as usize;
    let bg = background_color(app.now_ms);
    let mut grid: Vec<Vec<(char, Style)>> = vec![vec![(' ', Style::default().bg(bg)); w]; h];

    // Game over shows only the backdrop and the restart overlay.
    if app.game.phase != Phase::GameOver {
        for rect in &app.game.obstacles {
            paint_square(&mut grid, rect.x, rect.y, BLOCK_SIZE, OBSTACLE_COLOR, bg);
        }
        for rect in &app.game.powerups {
            paint_square(&mut grid, rect.x, rect.y, BLOCK_SIZE, POWERUP_COLOR, bg);
        }
        let player_color = if app.game.is_invincible() {
            SHIELDED_COLOR
        } else {
            PLAYER_COLOR
        };
        let player = app.game.player;
        paint_square(&mut grid, player.x, player.y, PLAYER_SIZE, player_color, bg);
    }

    let lines: Vec<Line> = grid
        .into_iter()
        .map(|row| {
            let spans: Vec<Span> = row
                .into_iter()
                .map(|(ch, style)| Span::styled(String::from(ch), style))
                .collect();
            Line::from(spans)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Map a logical coordinate to a cell index; may be negative for
/// entities still above the field.
fn cell(v: f32, logical: f32, cells: usize) -> i32 {
    (v / logical * cells as f32).floor() as i32
}

fn paint_square(
    grid: &mut [Vec<(char, Style)>],
    x: f32,
    y: f32,
    size: f32,
    color: Color,
    bg: Color,
) {
    let h = grid.len();
    let w = if h > 0 { grid[0].len() } else { 0 };
    let c0 = cell(x, FIELD_WIDTH, w);
    let c1 = cell(x + size, FIELD_WIDTH, w).max(c0 + 1);
    let r0 = cell(y, FIELD_HEIGHT, h);
    let r1 = cell(y + size, FIELD_HEIGHT, h).max(r0 + 1);
    for row in r0.max(0)..r1.min(h as i32) {
        for col in c0.max(0)..c1.min(w as i32) {
            grid[row as usize][col as usize] = ('█', Style::default().fg(color).bg(bg));
        }
    }
}

/// Cyclic backdrop hue: one step every 500 ms, wrapping at 255.
fn background_color(now_ms: u64) -> Color {
    let phase = ((now_ms / 500) % 255) as u8;
    Color::Rgb(phase, 100, 255 - phase)
}

fn render_overlay(frame: &mut Frame, area: Rect, title: &str, message: &str) {
    let overlay_w = (message.chars().count() as u16 + 6).min(area.width.saturating_sub(2));
    let overlay_h = 3u16.min(area.height);
    let x = area.x + area.width.saturating_sub(overlay_w) / 2;
    let y = area.y + area.height.saturating_sub(overlay_h) / 2;
    let overlay = Rect::new(x, y, overlay_w, overlay_h);

    // Clear whatever the field drew underneath
    frame.render_widget(Clear, overlay);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Rgb(255, 220, 80)))
        .title(title.to_string())
        .title_style(
            Style::default()
                .fg(Color::Rgb(255, 220, 80))
                .add_modifier(Modifier::BOLD),
        )
        .style(Style::default().bg(Color::Rgb(15, 15, 25)));
    let inner = block.inner(overlay);
    frame.render_widget(block, overlay);
    frame.render_widget(
        Paragraph::new(Line::from(message.to_string())).alignment(Alignment::Center),
        inner,
    );
}

fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help = match app.game.phase {
        Phase::GameOver => " R Restart │ Q Quit",
        Phase::Paused => " P Resume │ Q Quit",
        Phase::Playing => " ←/→ Move │ P Pause │ Q Quit",
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            help,
            Style::default().fg(Color::DarkGray),
        ))),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backdrop_sweeps_and_wraps() {
        assert_eq!(background_color(0), Color::Rgb(0, 100, 255));
        assert_eq!(background_color(499), Color::Rgb(0, 100, 255));
        assert_eq!(background_color(500), Color::Rgb(1, 100, 254));
        assert_eq!(background_color(500 * 255), Color::Rgb(0, 100, 255));
    }

    #[test]
    fn logical_units_map_onto_cells() {
        assert_eq!(cell(0.0, FIELD_WIDTH, 60), 0);
        assert_eq!(cell(300.0, FIELD_WIDTH, 60), 30);
        assert_eq!(cell(599.9, FIELD_WIDTH, 60), 59);
        // Entities above the field map to negative rows and are clipped.
        assert_eq!(cell(-50.0, FIELD_HEIGHT, 40), -3);
    }
}
