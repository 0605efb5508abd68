pub mod extractor;
pub mod matcher;

pub use extractor::EntityExtractor;
pub use matcher::{PhraseEntry, PhraseMatch, PhraseMatcher};
