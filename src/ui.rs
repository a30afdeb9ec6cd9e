use std::time::Duration;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    diff::Outcome,
    session::{Phase, Snapshot},
};

const HORIZONTAL_MARGIN: u16 = 5;
const GAME_BOX_WIDTH: u16 = 50;

/// Elapsed time the way the stopwatch shows it, e.g. `12.345s`
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.3}s", elapsed.as_secs_f64())
}

fn default_style() -> Style {
    Style::default().fg(Color::White)
}

fn hit_style() -> Style {
    Style::default().fg(Color::Rgb(0x0b, 0xf4, 0x8b))
}

fn miss_style() -> Style {
    default_style().bg(Color::Rgb(0xf1, 0x27, 0x46))
}

fn unwritten_style() -> Style {
    Style::default().fg(Color::Rgb(0x82, 0x82, 0x82))
}

fn cursor_style() -> Style {
    default_style()
        .bg(Color::Rgb(0x82, 0x82, 0x82))
        .add_modifier(Modifier::UNDERLINED)
}

/// Typed characters styled by outcome, then the cursor, then whatever is
/// left of the phrase
pub fn typed_spans(snapshot: &Snapshot<'_>) -> Vec<Span<'static>> {
    let mut spans = snapshot
        .typed
        .iter()
        .zip(snapshot.diff)
        .map(|(&c, outcome)| match outcome {
            Outcome::Hit => Span::styled(c.to_string(), hit_style()),
            Outcome::Miss => Span::styled(
                match c {
                    ' ' => "·".to_owned(),
                    c => c.to_string(),
                },
                miss_style(),
            ),
        })
        .collect::<Vec<Span>>();

    let phrase = snapshot.phrase.chars();
    let cursor = snapshot.cursor();
    if let Some(c) = snapshot.phrase.char_at(cursor) {
        spans.push(Span::styled(c.to_string(), cursor_style()));
        let rest: String = phrase[cursor + 1..].iter().collect();
        if !rest.is_empty() {
            spans.push(Span::styled(rest, unwritten_style()));
        }
    }

    spans
}

fn help_line(phase: Phase) -> Line<'static> {
    let toggle = match phase {
        Phase::Paused => "ctrl+s start",
        _ => "ctrl+s stop",
    };
    Line::from(Span::styled(
        format!("{toggle} • enter reset • ctrl+c quit"),
        unwritten_style(),
    ))
}

fn game_area(area: Rect, content_lines: u16) -> Rect {
    let width = (GAME_BOX_WIDTH + HORIZONTAL_MARGIN * 2).min(area.width);
    let height = content_lines.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_playing(snapshot: &Snapshot<'_>, area: Rect, buf: &mut Buffer) {
    let max_chars_per_line = GAME_BOX_WIDTH.min(area.width).max(1);
    let prompt_lines =
        (snapshot.phrase.as_str().width() as f64 / max_chars_per_line as f64).ceil() as u16;
    let prompt_lines = prompt_lines.max(1);

    // elapsed, gap, phrase, gap, typed, gap, help
    let content_lines = 1 + 1 + prompt_lines + 1 + prompt_lines + 1 + 1;
    let game = game_area(area, content_lines);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN.min(game.width / 4))
        .constraints([
            Constraint::Length(2),
            Constraint::Length(prompt_lines + 1),
            Constraint::Length(prompt_lines + 1),
            Constraint::Length(1),
        ])
        .split(game);

    Paragraph::new(Span::styled(
        format!("Elapsed: {}", format_elapsed(snapshot.elapsed)),
        default_style(),
    ))
    .render(chunks[0], buf);

    Paragraph::new(Span::styled(
        snapshot.phrase.as_str().to_owned(),
        default_style(),
    ))
    .wrap(Wrap { trim: false })
    .render(chunks[1], buf);

    Paragraph::new(Line::from(typed_spans(snapshot)))
        .wrap(Wrap { trim: false })
        .render(chunks[2], buf);

    Paragraph::new(help_line(snapshot.phase)).render(chunks[3], buf);
}

fn render_paused(area: Rect, buf: &mut Buffer) {
    let game = game_area(area, 5);
    Paragraph::new(Text::from(vec![
        Line::from(""),
        Line::from(Span::styled("Paused", default_style())),
    ]))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    )
    .render(game, buf);
}

fn render_finished(snapshot: &Snapshot<'_>, area: Rect, buf: &mut Buffer) {
    let game = game_area(area, 3);
    Paragraph::new(Text::from(vec![
        Line::from(Span::styled(
            format!(
                "Good job! Your final time was: {}",
                format_elapsed(snapshot.elapsed)
            ),
            hit_style().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("Press Enter to restart", unwritten_style())),
    ]))
    .alignment(Alignment::Center)
    .render(game, buf);
}

fn render_quitting(snapshot: &Snapshot<'_>, area: Rect, buf: &mut Buffer) {
    Paragraph::new(Span::styled(
        format!("Elapsed: {}", format_elapsed(snapshot.elapsed)),
        default_style(),
    ))
    .alignment(Alignment::Center)
    .render(game_area(area, 1), buf);
}

/// Static error box, used both for session failures and for startup
/// failures that happen before a session exists
pub fn render_failure(message: &str, area: Rect, buf: &mut Buffer) {
    let game = game_area(area, 5);
    Paragraph::new(Span::styled(message.to_owned(), default_style()))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Rgb(0xf1, 0x27, 0x46))),
        )
        .render(game, buf);
}

impl Widget for &Snapshot<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.phase {
            Phase::Playing => render_playing(self, area, buf),
            Phase::Paused => render_paused(area, buf),
            Phase::Finished => render_finished(self, area, buf),
            Phase::Quitting => render_quitting(self, area, buf),
            Phase::Erroring => {
                let message = self
                    .failure
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "Unknown error".to_owned());
                render_failure(&message, area, buf);
            }
        }
    }
}
