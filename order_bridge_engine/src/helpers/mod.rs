mod field_extractor;
mod secret;

pub use field_extractor::extract_field;
pub use secret::Secret;
