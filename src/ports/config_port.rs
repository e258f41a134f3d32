//! Configuration access port trait.

/// Read-only view of a sectioned key/value configuration.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;

    /// Comma-separated value, items trimmed, empty items dropped.
    fn get_list(&self, section: &str, key: &str) -> Option<Vec<String>> {
        let raw = self.get_string(section, key)?;
        Some(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Every section name present, in no particular order.
    fn sections(&self) -> Vec<String>;
}
