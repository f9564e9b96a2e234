pub mod client_ip;
pub mod cors;
pub mod request_id;
pub mod security_headers;

pub use client_ip::ClientInfo;
pub use cors::cors_layer;
pub use request_id::request_id_middleware;
pub use security_headers::{security_headers_middleware, SecurityPolicy};
