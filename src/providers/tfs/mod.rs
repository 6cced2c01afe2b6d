mod client;
mod information;
mod provider;
mod types;

pub use provider::TfsProvider;
