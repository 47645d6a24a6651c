pub const DEFAULT_PREFIX: &str = "[##_";
pub const DEFAULT_SUFFIX: &str = "_##]";
/// Largest template accepted by [`crate::Template::open`], in KiB (rounded).
pub const MAX_TEMPLATE_FILESIZE_KIB: u64 = 256;

/// Rendering options. Immutable once built; empty delimiters fall back to the defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateConfig {
    encode_on_insert: bool,
    prefix: String,
    suffix: String,
    max_template_kib: u64,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            encode_on_insert: true,
            prefix: DEFAULT_PREFIX.to_string(),
            suffix: DEFAULT_SUFFIX.to_string(),
            max_template_kib: MAX_TEMPLATE_FILESIZE_KIB,
        }
    }
}

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

impl TemplateConfig {
    pub fn new(encode_on_insert: bool, prefix: &str, suffix: &str) -> Self {
        Self {
            encode_on_insert,
            prefix: or_default(prefix, DEFAULT_PREFIX),
            suffix: or_default(suffix, DEFAULT_SUFFIX),
            ..Self::default()
        }
    }

    pub fn with_encode_on_insert(mut self, encode: bool) -> Self {
        self.encode_on_insert = encode;
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = or_default(prefix, DEFAULT_PREFIX);
        self
    }

    pub fn with_suffix(mut self, suffix: &str) -> Self {
        self.suffix = or_default(suffix, DEFAULT_SUFFIX);
        self
    }

    /// A zero limit falls back to [`MAX_TEMPLATE_FILESIZE_KIB`].
    pub fn with_max_template_kib(mut self, kib: u64) -> Self {
        self.max_template_kib = if kib == 0 {
            MAX_TEMPLATE_FILESIZE_KIB
        } else {
            kib
        };
        self
    }

    pub fn encode_on_insert(&self) -> bool {
        self.encode_on_insert
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn max_template_kib(&self) -> u64 {
        self.max_template_kib
    }

    /// The full marker for `key`, e.g. `[##_title_##]`.
    pub fn marker(&self, key: &str) -> String {
        let mut marker = String::with_capacity(self.prefix.len() + key.len() + self.suffix.len());
        marker.push_str(&self.prefix);
        marker.push_str(key);
        marker.push_str(&self.suffix);
        marker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = TemplateConfig::default();
        assert!(config.encode_on_insert());
        assert_eq!(config.prefix(), "[##_");
        assert_eq!(config.suffix(), "_##]");
        assert_eq!(config.max_template_kib(), 256);
        assert_eq!(config.marker("title"), "[##_title_##]");
    }

    #[test]
    fn empty_delimiters_fall_back_to_defaults() {
        let config = TemplateConfig::new(false, "", "}}");
        assert!(!config.encode_on_insert());
        assert_eq!(config.prefix(), DEFAULT_PREFIX);
        assert_eq!(config.suffix(), "}}");

        let config = TemplateConfig::default().with_prefix("{{").with_suffix("");
        assert_eq!(config.marker("x"), "{{x_##]");
    }

    #[test]
    fn zero_size_limit_falls_back() {
        let config = TemplateConfig::default().with_max_template_kib(0);
        assert_eq!(config.max_template_kib(), MAX_TEMPLATE_FILESIZE_KIB);
        let config = TemplateConfig::default().with_max_template_kib(4);
        assert_eq!(config.max_template_kib(), 4);
    }
}
