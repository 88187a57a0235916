pub mod csv_io;
pub mod firecrawl;
pub mod http_client;
pub mod memory_store;
pub mod pacing;
pub mod sqlite_store;
