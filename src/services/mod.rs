pub mod database;
pub mod poller;
pub mod scheduler;
pub mod tzkt;
