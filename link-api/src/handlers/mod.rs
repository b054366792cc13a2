mod app;
mod error;
mod links;

pub use app::add_routes;
