pub mod endpoint_client;

pub use endpoint_client::{EndpointClient, HttpEndpointClient};
