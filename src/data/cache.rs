/// Cache trait for storing and retrieving model completions by key.
///
/// Implementations should handle errors gracefully without panicking. A failed
/// lookup is a miss, a failed store is logged and dropped.
pub trait Cache {
    /// Retrieves a cached completion for the given key.
    ///
    /// # Returns
    /// * `Some(String)` - The cached completion if found
    /// * `None` - If the key doesn't exist or retrieval fails
    fn get(&self, key: &str) -> Option<String>;

    /// Stores a completion under the given key.
    fn set(&self, key: &str, value: &str);
}
