pub mod context;
pub mod controller;
pub mod crud;
pub mod flash;
pub mod handlers;
pub mod pagination;
pub mod pipeline;
pub mod request;
pub mod respond;
pub mod routes;
pub mod templates;
pub mod user_extractor;

pub use context::{PrepareContext, RenderedOptions, RequestContext};
pub use controller::{Controller, Hooks, QueryHook, SanitizeHook};
pub use crud::{Crud, Pipelines};
pub use flash::{FlashSession, FlashStore};
pub use pagination::{Paginate, Paging};
pub use pipeline::{Exchange, Flow, Pipeline, Step};
pub use request::CrudRequest;
pub use respond::ResponseFormat;
pub use routes::create_router;
pub use templates::View;
pub use user_extractor::CurrentUser;
