use serde::{ Deserialize, Serialize };
use std::fmt;
use std::str::FromStr;

/// Classification of what the customer is asking about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    SalesAdvisory,
    TechnicalSupport,
    ShippingInfo,
    OffTopic,
    /// Set by the parse fallback; a provider may also return it.
    Error,
}

impl Intent {
    pub const ALL: [Intent; 5] = [
        Intent::SalesAdvisory,
        Intent::TechnicalSupport,
        Intent::ShippingInfo,
        Intent::OffTopic,
        Intent::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::SalesAdvisory => "sales_advisory",
            Intent::TechnicalSupport => "technical_support",
            Intent::ShippingInfo => "shipping_info",
            Intent::OffTopic => "off_topic",
            Intent::Error => "error",
        }
    }
}

/// Follow-up the shop front-end may take after showing an answer.
/// Reported only; the agent never executes these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisorAction {
    CheckStock,
    OfferDiscount,
    EscalateToHuman,
    ShowCatalog,
    None,
}

impl AdvisorAction {
    pub const ALL: [AdvisorAction; 5] = [
        AdvisorAction::CheckStock,
        AdvisorAction::OfferDiscount,
        AdvisorAction::EscalateToHuman,
        AdvisorAction::ShowCatalog,
        AdvisorAction::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdvisorAction::CheckStock => "check_stock",
            AdvisorAction::OfferDiscount => "offer_discount",
            AdvisorAction::EscalateToHuman => "escalate_to_human",
            AdvisorAction::ShowCatalog => "show_catalog",
            AdvisorAction::None => "none",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownVariant {
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value '{}'", self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// Parses through serde so the accepted names are exactly the serialized ones.
fn parse_wire_name<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, UnknownVariant> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| UnknownVariant { value: s.to_string() })
}

impl FromStr for Intent {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_wire_name(s)
    }
}

impl FromStr for AdvisorAction {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_wire_name(s)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AdvisorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The only shape an answer may take on its way to the customer.
///
/// Instances are built by the validator (from provider output) or by the
/// parse fallback; `confidence_score` is always within `[0.0, 1.0]` and
/// `answer` is never empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructuredResponse {
    pub answer: String,
    pub confidence_score: f64,
    pub intent: Intent,
    pub recommended_actions: Vec<AdvisorAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// Outcome of the pre-flight input check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SafetyVerdict {
    pub allowed: bool,
    pub reason: String,
}

impl SafetyVerdict {
    pub fn allow() -> Self {
        Self { allowed: true, reason: "safe".to_string() }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self { allowed: false, reason: reason.into() }
    }
}
