mod client;
mod descriptor;

pub use client::{CapeApiClient, CapeApiError, DEFAULT_API_URL};
pub use descriptor::{CapeCategory, CapeDescriptor, RemoteDirectory, RemoteEntry};
