use serde::{Deserialize, Serialize};

macro_rules! label_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

label_newtype!(EventId);

/// Where a document was (or will be) processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteDecision {
    Local,
    Cloud,
}

impl RouteDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "LOCAL",
            Self::Cloud => "CLOUD",
        }
    }

    pub fn display_label(self) -> &'static str {
        match self {
            Self::Local => "LOCAL (On-Prem LLM)",
            Self::Cloud => "CLOUD (Azure OpenAI)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Display order of the risk distribution, least severe first.
    pub const ORDERED: [RiskLevel; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let upper = raw.trim().to_ascii_uppercase();
        Self::ORDERED
            .into_iter()
            .find(|level| level.as_str() == upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_risk_levels_case_insensitively() {
        assert_eq!(RiskLevel::parse("critical"), Some(RiskLevel::Critical));
        assert_eq!(RiskLevel::parse(" Medium "), Some(RiskLevel::Medium));
        assert_eq!(RiskLevel::parse("SAFETY"), None);
    }

    #[test]
    fn route_decision_serializes_as_upper_case() {
        let json = serde_json::to_string(&RouteDecision::Cloud).expect("serialize");
        assert_eq!(json, "\"CLOUD\"");
    }
}
