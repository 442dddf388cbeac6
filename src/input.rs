use crate::db::KvStore;
use crate::session::{MatchSession, Phase, Resolution};
use crossterm::event::{KeyCode, KeyEvent};
use std::time::Instant;

pub const GRID_COLUMNS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Menu,
    Match,
    ResetConfirm,
    QuitConfirm,
}

/// A running session plus the cursor the learner moves over the tile grid.
pub struct Board<S: KvStore> {
    pub session: MatchSession<S>,
    pub cursor: usize,
    pub last_resolution: Option<Resolution>,
}

impl<S: KvStore> Board<S> {
    pub fn start(mut session: MatchSession<S>, now: Instant) -> Self {
        session.start_batch(now);
        Self {
            session,
            cursor: 0,
            last_resolution: None,
        }
    }

    pub fn tick(&mut self, now: Instant) {
        if let Some(resolution) = self.session.tick(now) {
            self.last_resolution = Some(resolution);
        }
    }

    fn next_batch(&mut self, now: Instant) {
        self.session.start_batch(now);
        self.cursor = 0;
        self.last_resolution = None;
    }

    fn move_cursor(&mut self, code: KeyCode) {
        let len = self.session.tiles().len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let cursor = self.cursor.min(len - 1);
        self.cursor = match code {
            KeyCode::Left => cursor.saturating_sub(1),
            KeyCode::Right => (cursor + 1).min(len - 1),
            KeyCode::Up => cursor.saturating_sub(GRID_COLUMNS),
            KeyCode::Down if cursor + GRID_COLUMNS < len => cursor + GRID_COLUMNS,
            _ => cursor,
        };
    }
}

pub fn handle_match_input<S: KvStore>(
    board: &mut Board<S>,
    key: KeyEvent,
    app_state: &mut AppState,
    now: Instant,
) {
    match key.code {
        KeyCode::Esc => *app_state = AppState::QuitConfirm,
        KeyCode::Char('r') => *app_state = AppState::ResetConfirm,
        KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down => board.move_cursor(key.code),
        KeyCode::Char('n') if board.session.is_completed() => board.next_batch(now),
        KeyCode::Enter | KeyCode::Char(' ') => match board.session.phase() {
            Phase::Completed { .. } => board.next_batch(now),
            _ => {
                board.session.pick(board.cursor, now);
            }
        },
        _ => {}
    }
}

pub fn handle_reset_confirm_input<S: KvStore>(
    board: &mut Board<S>,
    key: KeyEvent,
    app_state: &mut AppState,
    now: Instant,
) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            board.session.reset_progress(now);
            board.cursor = 0;
            board.last_resolution = None;
            *app_state = AppState::Match;
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => *app_state = AppState::Match,
        _ => {}
    }
}

/// Returns true when the learner confirmed leaving; the caller drops the board.
pub fn handle_quit_confirm_input<S: KvStore>(
    board: &mut Board<S>,
    key: KeyEvent,
    app_state: &mut AppState,
) -> bool {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            board.session.end();
            *app_state = AppState::Menu;
            true
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            *app_state = AppState::Match;
            false
        }
        _ => false,
    }
}
