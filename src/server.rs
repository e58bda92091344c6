pub mod http;
pub mod routes;

pub use http::{ServerError, SimServer};
pub use routes::{HttpReply, SimRoutes, NOT_FOUND_ERROR, STATE_NOT_FOUND_ERROR, UNAUTHORIZED_ERROR};
