// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Locale of the current render, `language[_COUNTRY]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locale {
    /// Lowercase ISO 639 language code
    pub language: String,
    /// Uppercase ISO 3166 country code
    pub country: Option<String>,
}

impl Locale {
    /// Create a locale with a country
    pub fn new(language: &str, country: &str) -> Self {
        Self {
            language: language.to_ascii_lowercase(),
            country: (!country.is_empty()).then(|| country.to_ascii_uppercase()),
        }
    }

    /// Create a language-only locale
    pub fn language(language: &str) -> Self {
        Self {
            language: language.to_ascii_lowercase(),
            country: None,
        }
    }

    /// Parse `es_ES`, `es-ES` or `es`
    pub fn parse(tag: &str) -> Self {
        match tag.split_once(['_', '-']) {
            Some((language, country)) => Self::new(language, country),
            None => Self::language(tag),
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::language("en")
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.country {
            Some(country) => write!(f, "{}_{}", self.language, country),
            None => write!(f, "{}", self.language),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!(Locale::parse("es-es").to_string(), "es_ES");
        assert_eq!(Locale::parse("en").to_string(), "en");
        assert_eq!(Locale::default(), Locale::language("en"));
    }
}
