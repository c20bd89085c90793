pub mod audit;
pub mod chefs;
pub mod error;
pub mod events;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod tickets;

pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;
