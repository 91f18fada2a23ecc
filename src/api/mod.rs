/// HTTP error mapping and the JSON error envelope
pub mod errors;
/// Request handlers for the artist endpoints
pub mod handlers;
/// Router wiring and the server loop
pub mod routes;

pub use errors::ApiError;
pub use routes::{artist_routes, router, serve};
