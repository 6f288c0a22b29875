mod client;

pub use client::AeroDataBoxClient;
