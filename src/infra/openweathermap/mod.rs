mod client;

pub use client::OpenWeatherMapClient;
