pub mod client;
pub mod error;
pub mod links;
pub mod resolver;
pub(crate) mod types;

pub use client::GeminiClient;
pub use error::GeocodeError;
pub use links::coordinates_from_link;
pub use resolver::{Geocoder, GeocoderSettings, Resolution, ResolvedBy};
