#![forbid(unsafe_code)]

pub mod model;
pub mod rlp;
pub mod time;

pub use time::Clock;
