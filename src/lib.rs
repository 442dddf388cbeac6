pub mod batch;
pub mod config;
pub mod csv;
pub mod db;
pub mod input;
pub mod logger;
pub mod models;
pub mod progress;
pub mod session;
pub mod timer;
pub mod ui;
pub mod utils;


// Re-exports for convenience
pub use batch::{DEFAULT_ROUND_SIZE, commit_batch, select_batch};
pub use config::Config;
pub use csv::{deck_name, get_csv_files, load_csv};
pub use db::{KvStore, MemoryKv, SqliteKv, StoreError};
pub use input::{AppState, Board, handle_match_input};
pub use models::{Card, CardId, CardStats, MASTERY_STREAK, Progress, Side, Tile};
pub use progress::{ProgressStore, ensure_stats};
pub use session::{MatchSession, Phase, PickOutcome, Resolution, SessionConfig, deal_tiles};
pub use ui::{draw_board, draw_menu, draw_quit_confirmation, draw_reset_confirmation};
