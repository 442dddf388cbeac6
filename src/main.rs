use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use match_flashcards::db::{KvStore, MemoryKv, SqliteKv};
use match_flashcards::input::{handle_quit_confirm_input, handle_reset_confirm_input};
use match_flashcards::{
    deck_name, draw_board, draw_menu, draw_quit_confirmation, draw_reset_confirmation,
    get_csv_files, handle_match_input, load_csv, logger, AppState, Board, Config, MatchSession,
    ProgressStore,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

const TICK_RATE: Duration = Duration::from_millis(100);

fn open_backend(config: &Config) -> Box<dyn KvStore> {
    if !config.persist {
        logger::info("Persistence disabled, progress kept in memory");
        return Box::new(MemoryKv::new());
    }
    match SqliteKv::open(&config.data_dir) {
        Ok(kv) => Box::new(kv),
        Err(e) => {
            logger::error(&format!(
                "Could not open progress database in {}: {}; progress will not be saved",
                config.data_dir.display(),
                e
            ));
            Box::new(MemoryKv::new())
        }
    }
}

fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    logger::init(&config.log_file);
    logger::info(&format!("Starting with {:?}", config));

    let csv_files = get_csv_files(&config.flashcards_dir);
    // The store moves into each session and comes back when the board is dropped.
    let mut backend = Some(open_backend(&config));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = run(&mut terminal, &config, &csv_files, &mut backend);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &Config,
    csv_files: &[PathBuf],
    backend: &mut Option<Box<dyn KvStore>>,
) -> io::Result<()> {
    let mut app_state = AppState::Menu;
    let mut selected_file_index: usize = 0;
    let mut board: Option<Board<Box<dyn KvStore>>> = None;

    loop {
        let now = Instant::now();
        if let Some(board) = board.as_mut() {
            board.tick(now);
        }

        terminal.draw(|f| match (app_state, board.as_ref()) {
            (AppState::Match, Some(board)) => draw_board(f, board, now),
            (AppState::ResetConfirm, Some(board)) => {
                draw_reset_confirmation(f, board.session.set_id())
            }
            (AppState::QuitConfirm, Some(_)) => draw_quit_confirmation(f),
            _ => draw_menu(
                f,
                csv_files,
                selected_file_index,
                &config.learner_id,
                config.persist,
            ),
        })?;

        if !event::poll(TICK_RATE)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            break;
        }

        let now = Instant::now();
        match app_state {
            AppState::Menu => match key.code {
                KeyCode::Up => {
                    selected_file_index = selected_file_index.saturating_sub(1);
                }
                KeyCode::Down => {
                    if selected_file_index < csv_files.len().saturating_sub(1) {
                        selected_file_index += 1;
                    }
                }
                KeyCode::Enter => {
                    let Some(path) = csv_files.get(selected_file_index) else {
                        continue;
                    };
                    let cards = match load_csv(path) {
                        Ok(cards) => cards,
                        Err(e) => {
                            logger::error(&format!("Failed to load {}: {}", path.display(), e));
                            continue;
                        }
                    };
                    let Some(kv) = backend.take() else {
                        continue;
                    };
                    let session = MatchSession::new(
                        ProgressStore::new(kv),
                        config.learner_id.clone(),
                        deck_name(path),
                        cards,
                        config.session_config(),
                    );
                    board = Some(Board::start(session, now));
                    app_state = AppState::Match;
                }
                KeyCode::Char('q') | KeyCode::Esc => break,
                _ => {}
            },
            AppState::Match => {
                if let Some(board) = board.as_mut() {
                    handle_match_input(board, key, &mut app_state, now);
                }
            }
            AppState::ResetConfirm => {
                if let Some(board) = board.as_mut() {
                    handle_reset_confirm_input(board, key, &mut app_state, now);
                }
            }
            AppState::QuitConfirm => {
                let leave = board
                    .as_mut()
                    .is_some_and(|board| handle_quit_confirm_input(board, key, &mut app_state));
                if leave && let Some(finished) = board.take() {
                    *backend = Some(finished.session.into_store().into_backend());
                }
            }
        }
    }

    Ok(())
}
