pub mod cnb;
pub mod util;

pub use cnb::{CnbProvider, parse_rates};
