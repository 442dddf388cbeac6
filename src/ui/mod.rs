mod board;
mod dialogs;
pub mod layout;
mod menu;

pub use board::draw_board;
pub use dialogs::{draw_quit_confirmation, draw_reset_confirmation};
pub use layout::{calculate_board_chunks, centered_rect, grid_cells};
pub use menu::draw_menu;
