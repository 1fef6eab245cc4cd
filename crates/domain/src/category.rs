use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Request class that carries its own daily ceiling.
///
/// The set is closed: new categories are added here, not at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Chat,
    Photo,
    Recommend,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Chat, Category::Photo, Category::Recommend];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Chat => "chat",
            Category::Photo => "photo",
            Category::Recommend => "recommend",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown category name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(Category::Chat),
            "photo" => Ok(Category::Photo),
            "recommend" => Ok(Category::Recommend),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_agree() {
        for cat in Category::ALL {
            assert_eq!(cat.as_str().parse::<Category>().unwrap(), cat);
            assert_eq!(cat.to_string(), cat.as_str());
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "diagnose".parse::<Category>().unwrap_err();
        assert_eq!(err, UnknownCategory("diagnose".into()));
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&Category::Recommend).unwrap();
        assert_eq!(json, "\"recommend\"");
    }
}
