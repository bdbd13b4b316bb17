pub mod ehr;
pub mod enums;
pub mod field;
pub mod mapping;

pub use ehr::EhrPath;
pub use enums::{EhrCategory, FieldType, SuggestionSource};
pub use field::*;
pub use mapping::*;
