//! Common types used across the application.

pub mod id;
pub mod money;

pub use id::*;
pub use money::{BALANCE_TOLERANCE, MONEY_SCALE, amounts_agree, round_money};
