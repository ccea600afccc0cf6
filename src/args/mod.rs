/// Typed argument leaves and their transformer/validator pipeline.
pub mod argument;
pub mod map_arg;
pub mod transform;
pub mod validate;
pub mod value;

pub use argument::Argument;
pub use map_arg::{MapArg, key_name};
pub use transform::Transformer;
pub use validate::Validator;
pub use value::{ArgValue, Scalar};
