pub mod process;
pub mod schema_view;
pub mod urls;

pub use process::{process, sanitize};
pub use schema_view::*;
pub use urls::*;
