pub mod agendor_api_client;
pub mod executor;
pub mod processors;

pub use agendor_api_client::{AgendorApiClient, DealSource, RetryPolicy, TransportError};
pub use executor::load_master_table;
