mod extractor;

pub use extractor::{collapse_newlines, ContentExtractor};
