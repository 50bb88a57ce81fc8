use crate::item::ItemId;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur when reading or updating an inventory.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The requested item ID does not exist in the store.
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    /// No item matches the given name or ID reference.
    #[error("no item named \"{0}\"")]
    UnknownItem(String),

    /// An item with the same name already exists.
    #[error("item already exists: \"{0}\"")]
    DuplicateName(String),

    /// The actor has no resource pool with this name.
    #[error("unknown resource pool: {0}")]
    UnknownPool(String),

    /// Another thread panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,

    /// The inventory document could not be read or written.
    #[error("inventory I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The inventory document is not valid JSON for this schema.
    #[error("invalid inventory document: {0}")]
    Json(#[from] serde_json::Error),
}
