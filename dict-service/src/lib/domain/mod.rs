pub mod identity;
pub mod lexicon;
