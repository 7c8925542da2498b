use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Vi,
}

impl Locale {
    /// Unknown tags fall back to English.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "vi" | "vi-vn" => Locale::Vi,
            _ => Locale::En,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locale() {
        assert_eq!(Locale::parse("vi"), Locale::Vi);
        assert_eq!(Locale::parse("VI-VN"), Locale::Vi);
        assert_eq!(Locale::parse("en"), Locale::En);
        assert_eq!(Locale::parse("fr"), Locale::En);
    }
}
