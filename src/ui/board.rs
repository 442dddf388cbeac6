use crate::db::KvStore;
use crate::input::{Board, GRID_COLUMNS};
use crate::models::Side;
use crate::session::{Phase, Resolution};
use crate::ui::layout::{calculate_board_chunks, centered_rect, grid_cells};
use crate::utils::{format_duration, truncate_string};
use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use std::time::Instant;

fn key_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

fn status_line<S: KvStore>(board: &Board<S>) -> Line<'static> {
    if let Some(warning) = board.session.last_warning() {
        return Line::from(Span::styled(
            warning.to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    match &board.last_resolution {
        Some(Resolution::Matched { learned: true, .. })
        | Some(Resolution::BatchCompleted { learned: true, .. }) => Line::from(Span::styled(
            "Match! Card learned.",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Some(Resolution::Matched { .. }) | Some(Resolution::BatchCompleted { .. }) => {
            Line::from(Span::styled("Match!", Style::default().fg(Color::Green)))
        }
        Some(Resolution::Mismatched { .. }) => {
            Line::from(Span::styled("Not a pair.", Style::default().fg(Color::Red)))
        }
        None => Line::from(Span::styled(
            "Pick a term and its definition.",
            Style::default().fg(Color::DarkGray),
        )),
    }
}

pub fn draw_board<S: KvStore>(f: &mut Frame, board: &Board<S>, now: Instant) {
    let layout = calculate_board_chunks(f.area());
    let session = &board.session;
    let score = session.scoreboard();

    let best = session
        .best_time()
        .map(format_duration)
        .unwrap_or_else(|| "--".to_string());
    let header_text = format!(
        "{} | Time {} | Best {} | Learned {} | Remaining {} | Mistakes {}",
        session.set_id(),
        format_duration(session.elapsed(now)),
        best,
        score.learned,
        score.remaining,
        score.mistakes
    );
    let header = Paragraph::new(header_text)
        .style(key_style())
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, layout.header_area);

    if session.phase() == Phase::Empty {
        let notice = Paragraph::new("This deck has no cards to study.")
            .style(
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(notice, layout.grid_area);
    } else {
        draw_tiles(f, board, layout.grid_area);
    }

    let status = Paragraph::new(status_line(board))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(format!(
            "Pairs {}/{}",
            score.solved_pairs, score.total_pairs
        )));
    f.render_widget(status, layout.status_area);

    let help_text = vec![Line::from(vec![
        Span::styled("←↑↓→", key_style()),
        Span::from(" Move  "),
        Span::styled("Enter/Space", key_style()),
        Span::from(" Pick  "),
        Span::styled("r", key_style()),
        Span::from(" Reset Progress  "),
        Span::styled("Esc", key_style()),
        Span::from(" Menu"),
    ])];
    let help = Paragraph::new(help_text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, layout.help_area);

    if let Phase::Completed { elapsed } = session.phase() {
        draw_batch_complete(f, board, elapsed);
    }
}

fn draw_tiles<S: KvStore>(f: &mut Frame, board: &Board<S>, area: ratatui::layout::Rect) {
    let session = &board.session;
    let cells = grid_cells(area, session.tiles().len(), GRID_COLUMNS);

    for (i, (tile, cell)) in session.tiles().iter().zip(cells).enumerate() {
        let picked = session.is_picked(i);
        let border_style = if picked && session.is_locked() {
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
        } else if picked {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else if i == board.cursor {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let title = match tile.side {
            Side::Term => "Term",
            Side::Definition => "Definition",
        };
        let body = if tile.solved {
            Text::from(Span::styled("✓", Style::default().fg(Color::DarkGray)))
        } else {
            let width = cell.width.saturating_sub(2) as usize;
            let max_chars = width * cell.height.saturating_sub(2).max(1) as usize;
            Text::from(truncate_string(&tile.text, max_chars))
        };

        let mut block = Block::default().borders(Borders::ALL).border_style(border_style);
        if !tile.solved {
            block = block.title(title);
        }
        let widget = Paragraph::new(body)
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(widget, cell);
    }
}

fn draw_batch_complete<S: KvStore>(
    f: &mut Frame,
    board: &Board<S>,
    elapsed: std::time::Duration,
) {
    let area = centered_rect(50, 40, f.area());
    f.render_widget(Clear, area);

    let session = &board.session;
    let score = session.scoreboard();
    let record = match &board.last_resolution {
        Some(Resolution::BatchCompleted { summary, .. }) if summary.new_record => "New best time!",
        _ => "",
    };

    let mut text = Text::default();
    text.push_line(Line::from(Span::styled(
        "Batch complete",
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    )));
    text.push_line(Line::from(""));
    text.push_line(Line::from(format!("Time: {}", format_duration(elapsed))));
    if let Some(best) = session.best_time() {
        text.push_line(Line::from(format!("Best: {}", format_duration(best))));
    }
    text.push_line(Line::from(format!("Mismatches: {}", score.batch_mismatches)));
    text.push_line(Line::from(format!(
        "Learned {} of {} cards",
        score.learned,
        score.learned + score.remaining
    )));
    if !record.is_empty() {
        text.push_line(Line::from(Span::styled(
            record,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
    }
    text.push_line(Line::from(""));
    text.push_line(Line::from(vec![
        Span::styled("n/Enter", key_style()),
        Span::from(" Next Batch  "),
        Span::styled("Esc", key_style()),
        Span::from(" Menu"),
    ]));

    let popup = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        );
    f.render_widget(popup, area);
}
