//! Rules engine for a tile-matching puzzle.
//!
//! A [`game::logic::GameSession`] owns the board, score, move budget, item
//! inventory and, in boss mode, the [`boss::BossEncounter`]. Frontends drive
//! it with swaps and item uses and render what it reports through
//! [`observer::GameObserver`]. The [`console`] module is one such frontend.

pub mod ai;
pub mod boss;
pub mod console;
pub mod error;
pub mod game;
pub mod i18n;
pub mod items;
pub mod observer;
pub mod storage;
