mod handlers;
mod model;
mod routes;

pub use handlers::ping;
pub use model::*;
pub use routes::router;
