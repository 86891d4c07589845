use shelfscan_core::Item;

use crate::LookupError;

/// Outcome of resolving a decoded code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    /// The code belongs to an item.
    Found(Item),

    /// The API answered, and no item carries this code.
    NotFound,

    /// No answer could be obtained; worth retrying.
    TransientError(LookupError),
}

impl LookupResult {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// The resolved item, if any.
    pub fn item(&self) -> Option<&Item> {
        match self {
            Self::Found(item) => Some(item),
            _ => None,
        }
    }
}

impl From<LookupError> for LookupResult {
    fn from(error: LookupError) -> Self {
        Self::TransientError(error)
    }
}
