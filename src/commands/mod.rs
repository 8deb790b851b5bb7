pub mod hexbin;

pub use hexbin::{run_hexbin, HexbinArgs};
