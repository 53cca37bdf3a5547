pub mod connector;
pub mod ordering;
pub mod plan;
pub mod planner;
pub mod request;
pub mod route;
pub mod session;
pub mod station;
pub mod store;
pub mod trip;
pub mod vehicle;
