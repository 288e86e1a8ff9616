mod amount;

pub mod op;

pub use amount::{Amount, AmountConversionError};
