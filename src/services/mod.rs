pub mod lexicon;
pub mod sentiment;
