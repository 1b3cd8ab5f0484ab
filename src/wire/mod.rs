//! Wire protocol: the length-prefixed frame codec (spec.md §4.1) and the
//! reply JSON serializer (spec.md §6).

pub mod frame;
pub mod reply;

pub use frame::{read_frame, write_frame};
pub use reply::Reply;
