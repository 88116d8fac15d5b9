//! Static validation passes over rendered documents
//!
//! Passes never fail a render. Each one inspects the finished document and
//! returns zero or more [`Warning`]s; the adapter runs them in a fixed order
//! and keeps their output in that order.

use crate::document::ConfigDocument;
use crate::node::Node;
use crate::path::{DocPath, Segment};
use crate::version::{Profile, TargetVersion};
use crate::warning::{Warning, WarningCode};

/// What a pass gets to look at
#[derive(Debug, Clone, Copy)]
pub struct PassContext<'a> {
    pub document: &'a ConfigDocument,
    pub version: TargetVersion,
    pub profile: Profile,
}

/// A single static check
pub trait ValidationPass: Send + Sync {
    /// Code of the warnings this pass emits
    fn code(&self) -> WarningCode;

    fn check(&self, ctx: &PassContext<'_>) -> Vec<Warning>;
}

/// Built-in passes in the order they run
#[must_use]
pub fn default_passes() -> Vec<Box<dyn ValidationPass>> {
    vec![
        Box::new(WildcardOriginPass),
        Box::new(HealthCheckPass),
        Box::new(IntrospectionPass),
        Box::new(RateLimitPass),
    ]
}

fn path(keys: &[&str]) -> DocPath {
    DocPath::new(keys.iter().map(|key| Segment::key(*key)).collect())
}

/// `*` origins or allow-any-origin in production
#[derive(Debug, Clone, Copy, Default)]
pub struct WildcardOriginPass;

impl ValidationPass for WildcardOriginPass {
    fn code(&self) -> WarningCode {
        WarningCode::WildcardOriginInProduction
    }

    fn check(&self, ctx: &PassContext<'_>) -> Vec<Warning> {
        if !ctx.profile.is_production() {
            return Vec::new();
        }
        let mut warnings = Vec::new();

        let allow_any = path(&["cors", "allow_any_origin"]);
        if ctx.document.get(&allow_any) == Some(&Node::Bool(true)) {
            warnings.push(Warning::new(
                self.code(),
                allow_any.to_string(),
                "any origin is allowed in a production configuration",
            ));
        }

        let mut origin_lists = vec![path(&["cors", "origins"])];
        let policies = path(&["cors", "policies"]);
        if let Some(items) = ctx.document.get(&policies).and_then(Node::as_list) {
            origin_lists.extend((0..items.len()).map(|i| policies.item(i).child("origins")));
        }
        for list in origin_lists {
            let Some(origins) = ctx.document.get(&list) else {
                continue;
            };
            if origins.str_items().any(|origin| origin.trim() == "*") {
                warnings.push(Warning::new(
                    self.code(),
                    list.to_string(),
                    "wildcard origin '*' in a production configuration",
                ));
            }
        }
        warnings
    }
}

/// Health check explicitly turned off
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthCheckPass;

impl ValidationPass for HealthCheckPass {
    fn code(&self) -> WarningCode {
        WarningCode::MissingHealthCheck
    }

    fn check(&self, ctx: &PassContext<'_>) -> Vec<Warning> {
        let enabled = path(&["health_check", "enabled"]);
        match ctx.document.get(&enabled) {
            Some(Node::Bool(false)) => vec![Warning::new(
                self.code(),
                enabled.to_string(),
                "health check is disabled; orchestrators cannot probe the router",
            )],
            _ => Vec::new(),
        }
    }
}

/// Introspection on in production
#[derive(Debug, Clone, Copy, Default)]
pub struct IntrospectionPass;

impl ValidationPass for IntrospectionPass {
    fn code(&self) -> WarningCode {
        WarningCode::IntrospectionEnabledInProduction
    }

    fn check(&self, ctx: &PassContext<'_>) -> Vec<Warning> {
        let introspection = path(&["supergraph", "introspection"]);
        if ctx.profile.is_production()
            && ctx.document.get(&introspection) == Some(&Node::Bool(true))
        {
            vec![Warning::new(
                self.code(),
                introspection.to_string(),
                "introspection is enabled in a production configuration",
            )]
        } else {
            Vec::new()
        }
    }
}

/// No global rate limit in production
#[derive(Debug, Clone, Copy, Default)]
pub struct RateLimitPass;

impl ValidationPass for RateLimitPass {
    fn code(&self) -> WarningCode {
        WarningCode::MissingRateLimit
    }

    fn check(&self, ctx: &PassContext<'_>) -> Vec<Warning> {
        let limit = path(&["traffic_shaping", "router", "global_rate_limit"]);
        if ctx.profile.is_production() && !ctx.document.contains(&limit) {
            vec![Warning::new(
                self.code(),
                limit.to_string(),
                "no global rate limit on router-facing traffic",
            )]
        } else {
            Vec::new()
        }
    }
}
