//! Currency conversion through an external exchange-rate provider.

mod code;
mod gateway;

pub use code::*;
pub use gateway::*;
