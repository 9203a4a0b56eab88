//! Configuration access port trait.
//!
//! Values come back as raw strings; typed parsing and validation happen in
//! `config_validation`.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Comma-separated value split into trimmed, non-empty items.
    /// `None` when the key is absent; an empty value yields an empty list.
    fn get_list(&self, section: &str, key: &str) -> Option<Vec<String>> {
        self.get_string(section, key).map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}
