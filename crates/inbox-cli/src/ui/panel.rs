//! Notification panel — the dropdown list of unread items.

use inbox_core::{notification::Notification, panel::PanelPhase};
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::app::App;

/// Render the panel into `area`. Entering and leaving frames are dimmed.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let unread = app.center.unread();

  let settled = matches!(app.center.panel().phase(), PanelPhase::Open);
  let border = if settled { Color::Cyan } else { Color::DarkGray };

  let block = Block::default()
    .title(format!(" Notifications ({}) ", unread.len()))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));
  let inner = block.inner(area);
  f.render_widget(block, area);

  if !settled {
    return;
  }

  if unread.is_empty() {
    f.render_widget(
      Paragraph::new(Span::styled(
        "Nothing new.",
        Style::default().fg(Color::DarkGray),
      )),
      inner,
    );
    return;
  }

  let items: Vec<ListItem> = unread.iter().map(item).collect();

  let mut state = ListState::default();
  state.select(Some(app.cursor));

  f.render_stateful_widget(
    List::new(items)
      .highlight_style(
        Style::default()
          .bg(Color::Blue)
          .fg(Color::White)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("▸ "),
    inner,
    &mut state,
  );
}

fn item(n: &Notification) -> ListItem<'static> {
  let when = n
    .created_at
    .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
    .unwrap_or_default();

  let mut lines = vec![Line::from(vec![
    Span::styled(format!("[{}] ", n.kind), Style::default().fg(Color::Magenta)),
    Span::styled(n.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
    Span::styled(format!("  {when}"), Style::default().fg(Color::DarkGray)),
  ])];

  if let Some(body) = n.body.as_deref().filter(|b| !b.is_empty()) {
    lines.push(Line::from(Span::styled(
      format!("  {body}"),
      Style::default().fg(Color::Gray),
    )));
  }

  ListItem::new(lines)
}
