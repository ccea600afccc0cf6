/// Flags: descriptors and the sub-engine that pulls them out of the stream.
pub mod flag;
pub mod processor;

pub use flag::{BoolFlag, BoolValuesFlag, Flag, FlagCapabilities, FlagInterface, ItemizedListFlag};
pub use processor::{END_OF_FLAGS, FlagProcessor};
