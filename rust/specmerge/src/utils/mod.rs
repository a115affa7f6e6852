pub mod peak_utils;
pub mod tuple_range;

pub use tuple_range::{
    TupleRange,
    TupleRangeError,
};
