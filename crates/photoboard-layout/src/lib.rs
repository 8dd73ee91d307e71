pub mod elements;
pub mod layout;
pub mod pagination;
pub mod photo;
pub mod positions;
pub mod settings;
mod types;

pub use elements::{Consign, Document, Footer, Header, Page, PhotoSet};
pub use pagination::{build_document, paginate};
pub use photo::{load_photos, valid_photos, Photo};
pub use positions::{parse_positions, write_positions, PositionsFile, PositionsRegistry};
pub use settings::*;
pub use types::*;
