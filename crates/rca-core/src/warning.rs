//! Non-fatal findings attached to a render

use std::fmt::{self, Display, Formatter};

use serde::Serialize;

/// What a warning is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum WarningCode {
    /// `*` origin (or allow-any-origin) in a production config
    WildcardOriginInProduction,
    /// Health check explicitly disabled
    MissingHealthCheck,
    /// Schema introspection left on in production
    IntrospectionEnabledInProduction,
    /// No global rate limit on router-facing traffic in production
    MissingRateLimit,
    /// Document used `preview_operation_limits`, read as `limits`
    LegacyOperationLimits,
}

impl WarningCode {
    /// Stable kebab-case identifier
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WildcardOriginInProduction => "wildcard-origin-in-production",
            Self::MissingHealthCheck => "missing-health-check",
            Self::IntrospectionEnabledInProduction => "introspection-enabled-in-production",
            Self::MissingRateLimit => "missing-rate-limit",
            Self::LegacyOperationLimits => "legacy-operation-limits",
        }
    }
}

impl From<WarningCode> for String {
    fn from(code: WarningCode) -> Self {
        code.as_str().to_string()
    }
}

impl Display for WarningCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A warning raised while rendering or reading a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub code: WarningCode,
    /// Document path or setting key the warning concerns
    pub path: String,
    pub message: String,
}

impl Warning {
    #[must_use]
    pub fn new(code: WarningCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl Display for Warning {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.path, self.message)
    }
}
