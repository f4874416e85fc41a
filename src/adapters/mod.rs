// Adapters layer: reqwest implementations of the domain ports.

pub mod climate;
pub mod geocoder;
pub mod http;
pub mod soil;
pub mod weather;

pub use climate::NasaPowerClimate;
pub use geocoder::NominatimGeocoder;
pub use soil::SoilGridsSoil;
pub use weather::OpenWeatherMap;
