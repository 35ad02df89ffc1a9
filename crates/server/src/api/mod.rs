pub mod audit;
pub mod classifier;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod tickets;

pub use routes::create_router;
