pub mod document;
pub mod message;
pub mod options;
pub mod schema;
pub mod user_context;

pub use document::*;
pub use message::*;
pub use options::*;
pub use schema::*;
pub use user_context::*;
