use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid value for {field}: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Language {
    En => "EN",
    De => "DE",
});

str_enum!(ErrorKind {
    Validation => "validation",
    FileNotFound => "file_not_found",
    Processing => "processing",
    Unexpected => "unexpected",
});

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::De];

    /// Parses a language code such as `EN` or `de`.
    pub fn from_code(code: &str) -> Result<Self, InvalidEnum> {
        code.trim().to_ascii_uppercase().parse()
    }

    /// Identifier of the statistical model serving this language.
    pub fn model_name(&self) -> &'static str {
        match self {
            Self::En => "en_core_web_lg",
            Self::De => "de_core_news_lg",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn language_round_trip() {
        for (variant, s) in [(Language::En, "EN"), (Language::De, "DE")] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(Language::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn language_code_is_case_insensitive() {
        assert_eq!(Language::from_code("en").unwrap(), Language::En);
        assert_eq!(Language::from_code(" De ").unwrap(), Language::De);
    }

    #[test]
    fn unknown_language_is_rejected() {
        let err = Language::from_code("FR").unwrap_err();
        assert_eq!(err.field, "Language");
        assert_eq!(err.value, "FR");
    }

    #[test]
    fn model_names() {
        assert_eq!(Language::En.model_name(), "en_core_web_lg");
        assert_eq!(Language::De.model_name(), "de_core_news_lg");
    }

    #[test]
    fn error_kind_round_trip() {
        for (variant, s) in [
            (ErrorKind::Validation, "validation"),
            (ErrorKind::FileNotFound, "file_not_found"),
            (ErrorKind::Processing, "processing"),
            (ErrorKind::Unexpected, "unexpected"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(ErrorKind::from_str(s).unwrap(), variant);
        }
    }
}
