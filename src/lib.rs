mod osm2mobsink;
pub use crate::osm2mobsink::categorize::{parse_maxspeed, UnreadableTag, WayProperties};
pub use crate::osm2mobsink::diagnostics::Diagnostics;
pub use crate::osm2mobsink::error::{Error, Warning};
pub use crate::osm2mobsink::models::*;
pub use crate::osm2mobsink::projection::{
    Projector, SizePolicy, DEFAULT_SPEED_LIMIT, DEFAULT_WIDTH,
};
pub use crate::osm2mobsink::reader::{read_document, read_str, Config, GapPolicy};
pub use crate::osm2mobsink::writers;
pub use crate::osm2mobsink::{convert, convert_file};
