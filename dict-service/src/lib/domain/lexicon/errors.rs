use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum WordError {
    #[error("Word must not be blank")]
    Blank,
    #[error("Word must be at most {0} characters")]
    TooLong(usize),
}

#[derive(Debug, Error, PartialEq)]
pub enum EntryIdError {
    #[error("Invalid entry ID: {0}")]
    InvalidFormat(String),
}

#[derive(Debug, Error)]
pub enum LexiconError {
    /// Uniform denial for every authentication/authorization failure.
    #[error("Access denied")]
    Denied,

    #[error(transparent)]
    InvalidWord(#[from] WordError),

    #[error(transparent)]
    InvalidEntryId(#[from] EntryIdError),

    #[error("Word not found in dictionary: {0}")]
    WordNotFound(String),

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Entry {0} was not submitted by you")]
    NotEntryAuthor(String),

    #[error("You haven't submitted any entries yet")]
    NoAuthoredEntries,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
