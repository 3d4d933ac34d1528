pub mod coord;
pub mod error;
pub mod identifier;
pub mod time;

pub use coord::{Coordinate, FixedGeoCoordinate, degrees_to_e6, e6_to_degrees};
pub use error::CityPulseError;
pub use identifier::{decode_cell_key, generate_cell_key};
pub use time::now_unix;
