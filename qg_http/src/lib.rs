pub mod client;
pub mod errors;
pub mod headers;
pub mod paced;

pub use client::ApiCredentials;
pub use client::HttpClient;
pub use client::HttpClientConfig;
pub use errors::HttpError;
pub use errors::Result;
pub use headers::ResponseHeaders;
pub use paced::PacedClient;
