//! Win probability, swing attribution and composite ratings for round based 5v5 matches.

pub mod batch;
pub mod credit;
pub mod driver;
pub mod economy;
pub mod engine;
pub mod events;
pub mod rating;
pub mod round;
pub mod swing;
pub mod tables;
pub mod tracker;

mod error;
pub use error::Error;

pub use common::{PlayerId, Side};
