//! Tenant-side models: chatbots, subscriptions, and audit kinds.

use serde::{Deserialize, Serialize};

/// Which audit a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    Compliance,
    Performance,
}

impl AuditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compliance => "compliance",
            Self::Performance => "performance",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "compliance" => Some(Self::Compliance),
            "performance" => Some(Self::Performance),
            _ => None,
        }
    }

    /// Capitalized label used in user-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Compliance => "Compliance",
            Self::Performance => "Performance",
        }
    }
}

impl std::fmt::Display for AuditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription plan bounding weekly audit triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Trial,
    Free,
    Starter,
    Growth,
    Scale,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trial => "Trial",
            Self::Free => "Free",
            Self::Starter => "Starter",
            Self::Growth => "Growth",
            Self::Scale => "Scale",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Trial" => Some(Self::Trial),
            "Free" => Some(Self::Free),
            "Starter" => Some(Self::Starter),
            "Growth" => Some(Self::Growth),
            "Scale" => Some(Self::Scale),
            _ => None,
        }
    }

    /// Audits of each kind allowed per rolling window.
    pub fn weekly_limit(&self) -> u32 {
        match self {
            Self::Trial | Self::Free | Self::Starter => 1,
            Self::Growth => 2,
            Self::Scale => 4,
        }
    }
}

/// A tenant's chatbot installation. Audits are requested per chatbot and
/// billed to its organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chatbot {
    pub chatbot_id: String,
    pub organization_id: String,
}

impl Chatbot {
    pub fn new(chatbot_id: impl Into<String>, organization_id: impl Into<String>) -> Self {
        Self {
            chatbot_id: chatbot_id.into(),
            organization_id: organization_id.into(),
        }
    }
}

/// Organization subscription carrying the quota ledger fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub organization_id: String,
    /// Raw plan name as stored; unknown names fall back to a limit of 1.
    pub tier: String,
    pub compliance_trigger_count: u32,
    pub performance_trigger_count: u32,
}

impl Subscription {
    pub fn new(organization_id: impl Into<String>, tier: Tier) -> Self {
        Self {
            organization_id: organization_id.into(),
            tier: tier.as_str().to_string(),
            compliance_trigger_count: 0,
            performance_trigger_count: 0,
        }
    }

    /// Plan name, defaulting to Trial when unset.
    pub fn tier_name(&self) -> &str {
        if self.tier.is_empty() {
            Tier::Trial.as_str()
        } else {
            &self.tier
        }
    }

    pub fn weekly_limit(&self) -> u32 {
        Tier::from_str(self.tier_name())
            .map(|t| t.weekly_limit())
            .unwrap_or(1)
    }

    pub fn trigger_count(&self, kind: AuditKind) -> u32 {
        match kind {
            AuditKind::Compliance => self.compliance_trigger_count,
            AuditKind::Performance => self.performance_trigger_count,
        }
    }

    pub fn set_trigger_count(&mut self, kind: AuditKind, count: u32) {
        match kind {
            AuditKind::Compliance => self.compliance_trigger_count = count,
            AuditKind::Performance => self.performance_trigger_count = count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_limits() {
        assert_eq!(Tier::Trial.weekly_limit(), 1);
        assert_eq!(Tier::Free.weekly_limit(), 1);
        assert_eq!(Tier::Starter.weekly_limit(), 1);
        assert_eq!(Tier::Growth.weekly_limit(), 2);
        assert_eq!(Tier::Scale.weekly_limit(), 4);
    }

    #[test]
    fn test_unknown_tier_defaults_to_one() {
        let mut sub = Subscription::new("org", Tier::Scale);
        sub.tier = "Enterprise".to_string();
        assert_eq!(sub.weekly_limit(), 1);

        sub.tier = String::new();
        assert_eq!(sub.tier_name(), "Trial");
        assert_eq!(sub.weekly_limit(), 1);
    }

    #[test]
    fn test_trigger_counts_are_per_kind() {
        let mut sub = Subscription::new("org", Tier::Growth);
        sub.set_trigger_count(AuditKind::Performance, 2);
        assert_eq!(sub.trigger_count(AuditKind::Performance), 2);
        assert_eq!(sub.trigger_count(AuditKind::Compliance), 0);
    }

    #[test]
    fn test_audit_kind_roundtrip_names() {
        assert_eq!(AuditKind::from_str("compliance"), Some(AuditKind::Compliance));
        assert_eq!(AuditKind::Performance.as_str(), "performance");
        assert_eq!(AuditKind::from_str("speed"), None);
    }
}
