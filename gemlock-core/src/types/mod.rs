mod outcome;
mod record;

pub use outcome::*;
pub use record::*;
