pub mod element;
pub mod extractor;
