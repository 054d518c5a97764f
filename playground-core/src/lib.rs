pub mod accounts;
pub mod admin;
pub mod game_events;
pub mod kv_store;
pub mod number_guess;
pub mod profile;
pub mod score_store;
pub mod tic_tac_toe;

// Re-export main components
pub use accounts::*;
pub use admin::*;
pub use game_events::*;
pub use kv_store::*;
pub use number_guess::*;
pub use profile::*;
pub use score_store::*;
pub use tic_tac_toe::*;
