pub mod constants;
pub mod string_utils;
pub mod timeout;

pub use constants::*;
pub use string_utils::{collapse_whitespace, safe_truncate_chars, squeeze_blank_lines};
pub use timeout::with_timeout;
