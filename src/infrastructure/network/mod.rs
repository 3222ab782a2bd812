pub mod http;
pub mod oracle;
pub mod places;
