pub mod bus;
pub mod dao;
pub mod enrichment;
pub mod ingest;
pub mod recent;
pub mod store;

pub use bus::EventBus;
