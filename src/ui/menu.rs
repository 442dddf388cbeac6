use crate::csv::deck_name;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use std::path::PathBuf;

fn key_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

pub fn draw_menu(
    f: &mut Frame,
    csv_files: &[PathBuf],
    selected_file_index: usize,
    learner_id: &str,
    persist: bool,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(f.area());

    let title = Paragraph::new("Match Flashcards v0.1.0")
        .style(key_style())
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    let deck_items: Vec<ListItem> = if csv_files.is_empty() {
        vec![ListItem::new("No CSV decks found").style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )]
    } else {
        csv_files
            .iter()
            .enumerate()
            .map(|(i, path)| {
                let style = if i == selected_file_index {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(deck_name(path)).style(style)
            })
            .collect()
    };

    let decks = List::new(deck_items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title("Decks"),
    );
    f.render_widget(decks, chunks[1]);

    let footer_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(chunks[2]);

    let storage = if persist { "saved" } else { "not saved" };
    let learner = Paragraph::new(format!("{} (progress {})", learner_id, storage))
        .style(Style::default().fg(if persist { Color::Green } else { Color::Yellow }))
        .block(Block::default().borders(Borders::ALL).title("Learner"));
    f.render_widget(learner, footer_chunks[0]);

    let help_text = vec![Line::from(vec![
        Span::styled("↑/↓", key_style()),
        Span::from(" Navigate  "),
        Span::styled("Enter", key_style()),
        Span::from(" Play  "),
        Span::styled("q/Ctrl+C", key_style()),
        Span::from(" Quit"),
    ])];
    let help = Paragraph::new(help_text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, footer_chunks[1]);
}
