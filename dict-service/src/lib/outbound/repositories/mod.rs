pub mod identity;
pub mod lexicon;

pub use identity::PostgresIdentityRepository;
pub use lexicon::PostgresLexiconRepository;
