pub mod clients;
pub mod deliveries;
pub mod progress;
pub mod revisions;
pub mod teardown;
pub mod utils;
