mod client;
pub mod discovery;
pub mod open_charge_map;
pub mod osrm;
pub mod routing;
