mod url;

pub use url::{LinkRecord, ShortenRequest, ShortenResponse};
