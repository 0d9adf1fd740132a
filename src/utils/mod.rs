pub mod constants;
pub mod coordinates;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use coordinates::{fixed_field, parse_latitude, parse_longitude};
pub use filename::{
    generate_default_output_filename, generate_default_reference_filename,
    generate_default_simple_average_filename,
};
pub use progress::ProgressReporter;
