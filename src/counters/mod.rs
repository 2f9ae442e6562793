pub mod coordinator;
pub mod error;
pub mod line_counter;
pub mod memory;
pub mod table;
pub mod token;
pub mod worker;

pub use coordinator::Coordinator;
pub use error::CountError;
pub use memory::{format_bytes, PeakMemory};
pub use table::FrequencyTable;
pub use token::Token;

pub const MAX_UNIQUE_NAMES: usize = 100;
pub const MAX_NAME_LENGTH: usize = 30;

/// Bounds shared by every table in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Most distinct names a single table will hold.
    pub max_unique: usize,
    /// Names longer than this many characters are truncated.
    pub max_name_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_unique: MAX_UNIQUE_NAMES,
            max_name_length: MAX_NAME_LENGTH,
        }
    }
}
