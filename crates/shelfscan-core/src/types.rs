use crate::{
    Result,
    constants::{ITEM_CODE_PREFIX, MAX_ITEM_CODE_LENGTH},
    error::Error,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Payload decoded from a QR label, used as the lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemCode(String);

impl ItemCode {
    /// Create a new item code with validation.
    ///
    /// The code is trimmed before validation; case is preserved because
    /// backend tokens are case sensitive.
    ///
    /// # Errors
    /// Returns `Error::InvalidItemCode` if:
    /// - The code is empty after trimming
    /// - The code is longer than `MAX_ITEM_CODE_LENGTH` bytes
    /// - The code contains control characters
    pub fn new(code: &str) -> Result<Self> {
        let code = code.trim();

        if code.is_empty() {
            return Err(Error::InvalidItemCode("Item code is empty".to_string()));
        }

        let len = code.len();
        if len > MAX_ITEM_CODE_LENGTH {
            return Err(Error::InvalidItemCode(format!(
                "Item code must be at most {MAX_ITEM_CODE_LENGTH} bytes, got {len}"
            )));
        }

        if code.chars().any(char::is_control) {
            return Err(Error::InvalidItemCode(
                "Item code contains control characters".to_string(),
            ));
        }

        Ok(ItemCode(code.to_string()))
    }

    /// Get the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the code looks like one minted by the inventory backend.
    #[must_use]
    pub fn is_inventory_code(&self) -> bool {
        self.0.starts_with(ITEM_CODE_PREFIX)
    }
}

impl fmt::Display for ItemCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ItemCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ItemCode::new(s)
    }
}

impl TryFrom<String> for ItemCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        ItemCode::new(&value)
    }
}

impl From<ItemCode> for String {
    fn from(code: ItemCode) -> Self {
        code.0
    }
}

/// Inventory item identifier, handed to navigation once a code resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    #[must_use]
    pub fn new(id: u64) -> Self {
        ItemId(id)
    }

    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session generation counter.
///
/// Every asynchronous operation captures the generation current when it was
/// issued. Results carrying an older generation are discarded on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Generation(u64);

impl Generation {
    /// The generation of a freshly created session.
    pub const INITIAL: Generation = Generation(0);

    /// Return the following generation.
    #[must_use]
    pub fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }

    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}

/// Storage location summary embedded in an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemLocation {
    pub id: u64,
    #[serde(default)]
    pub full_address: Option<String>,
    #[serde(default)]
    pub location_type: Option<String>,
}

/// Inventory item as returned by the lookup API.
///
/// Only the fields the scanner shows are modelled; anything else in the
/// payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location_id: Option<u64>,
    #[serde(default)]
    pub location: Option<ItemLocation>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
}

/// Tags arrive either as a list or as a single comma/newline separated
/// string, sometimes wrapped in braces and quotes.
fn deserialize_tags<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTags {
        List(Vec<String>),
        Text(String),
        Null(()),
    }

    let tags = match RawTags::deserialize(deserializer)? {
        RawTags::List(list) => list,
        RawTags::Text(text) => text
            .replace(['{', '}', '"'], "")
            .split([',', '\n'])
            .map(str::to_string)
            .collect(),
        RawTags::Null(()) => Vec::new(),
    };

    Ok(tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}
