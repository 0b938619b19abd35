pub mod cursor;
pub mod error;
pub mod key;
pub mod post;
