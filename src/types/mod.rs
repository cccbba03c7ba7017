pub mod trading;
pub mod performance;
pub mod trade;

pub use trading::*;
pub use performance::*;
pub use trade::*;
