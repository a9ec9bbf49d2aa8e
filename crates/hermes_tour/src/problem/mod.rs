pub mod activity;
pub mod capacity;
pub mod job;
pub mod job_builder;
pub mod location;
pub mod time_window;
pub mod travel_cost_matrix;
pub mod travel_time_oracle;
pub mod vehicle;
pub mod vehicle_routing_problem;
