//! TUI rendering — header badge, notification panel, status bar.

pub mod panel;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::app::App;

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let area = f.area();

  // Vertical stack: header, body, status bar.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  draw_body(f, rows[1], app);
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let date = Local::now().format("%Y-%m-%d").to_string();

  let left = Span::styled(
    " inbox  [n] notifications  [r] reload  [q] quit",
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );

  let count = app.center.unread_count();
  let badge = if app.center.is_loading() {
    Span::styled(" syncing… ", Style::default().fg(Color::Yellow))
  } else if count > 0 {
    Span::styled(
      format!(" ● {count} unread "),
      Style::default()
        .fg(Color::Black)
        .bg(Color::Red)
        .add_modifier(Modifier::BOLD),
    )
  } else {
    Span::styled(" no unread ", Style::default().fg(Color::Gray))
  };
  let right = Span::styled(
    format!(" {date} "),
    Style::default().fg(Color::Gray),
  );

  // Simple left-right header: pad the middle.
  let used = [&left, &badge, &right]
    .iter()
    .map(|s| s.width() as u16)
    .sum::<u16>();
  let pad = area.width.saturating_sub(used);

  let line = Line::from(vec![
    left,
    Span::raw(" ".repeat(pad as usize)),
    badge,
    right,
  ]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body(f: &mut Frame, area: Rect, app: &App) {
  if !app.center.panel().is_visible() {
    draw_closed(f, area, app);
    return;
  }

  // Panel docks to the right, like a dropdown under the badge.
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
    .split(area);

  draw_closed(f, cols[0], app);
  panel::draw(f, cols[1], app);
}

fn draw_closed(f: &mut Frame, area: Rect, app: &App) {
  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let hint = match app.center.unread_count() {
    0 => "You're all caught up.".to_string(),
    1 => "1 unread notification. Press n to open.".to_string(),
    n => format!("{n} unread notifications. Press n to open."),
  };
  f.render_widget(
    Paragraph::new(Line::from(vec![Span::styled(
      hint,
      Style::default().fg(Color::DarkGray),
    )])),
    inner,
  );
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let panel_open = app.center.panel().is_open();
  let (mode_label, hints) = if panel_open {
    (
      "PANEL",
      "↑↓/jk move  Enter/x mark read  a mark all  Esc close  r reload  q quit",
    )
  } else {
    ("NORMAL", "n open notifications  r reload  q quit")
  };

  let (text, text_style) = if let Some(err) = app.center.error() {
    (format!("  {err}  (Esc to dismiss)"), Style::default().fg(Color::Red))
  } else if !app.status_msg.is_empty() {
    (format!("  {}", app.status_msg), Style::default().fg(Color::Gray))
  } else {
    (format!("  {hints}"), Style::default().fg(Color::DarkGray))
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );

  let line = Line::from(vec![mode_span, Span::styled(text, text_style)]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}
