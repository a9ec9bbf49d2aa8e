pub mod route;
pub mod route_update_iterator;
pub mod schedule;
pub mod schedule_params;
pub mod statistics;
mod utils;
