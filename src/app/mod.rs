pub mod discovery_use_case;
pub mod ports;
pub mod scrape_use_case;
pub mod status_use_case;
