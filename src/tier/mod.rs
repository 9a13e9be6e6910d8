//! Tier policy — the fixed table from authenticity status and issuer trust
//! to the final credibility tier
//!
//! | Authenticity | Issuer tier       | Final tier                    |
//! |--------------|-------------------|-------------------------------|
//! | Fake         | any               | Unrated                       |
//! | Uncertain    | any               | Tier 3 (review required)      |
//! | Real         | Tier1             | Tier 1                        |
//! | Real         | Tier2             | Tier 2                        |
//! | Real         | Tier3 / Unknown   | Tier 3                        |
//!
//! Rows are evaluated in this order. Status and issuer tier are total
//! enums, so the match is exhaustive at compile time — there is no
//! representable combination outside the table.

use crate::authenticity::AuthenticityStatus;
use crate::registry::TrustTier;
use serde::{Deserialize, Serialize};

/// Final credibility rank of a certificate. Serialized with the stable
/// external names ("Tier 1", …, "Unrated").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredibilityTier {
    #[serde(rename = "Tier 1")]
    Tier1,
    #[serde(rename = "Tier 2")]
    Tier2,
    #[serde(rename = "Tier 3")]
    Tier3,
    #[serde(rename = "Unrated")]
    Unrated,
}

impl std::fmt::Display for CredibilityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tier1 => write!(f, "Tier 1"),
            Self::Tier2 => write!(f, "Tier 2"),
            Self::Tier3 => write!(f, "Tier 3"),
            Self::Unrated => write!(f, "Unrated"),
        }
    }
}

/// Apply the policy table. Returns the final tier and whether a human
/// review is required (Uncertain outcomes only). Status is always decided
/// before this runs — a fake certificate from a real issuer confers no
/// credibility, so Fake forces Unrated regardless of the issuer match.
pub fn assign_tier(
    status: AuthenticityStatus,
    issuer_tier: TrustTier,
) -> (CredibilityTier, bool) {
    match (status, issuer_tier) {
        (AuthenticityStatus::Fake, _) => (CredibilityTier::Unrated, false),
        (AuthenticityStatus::Uncertain, _) => (CredibilityTier::Tier3, true),
        (AuthenticityStatus::Real, TrustTier::Tier1) => (CredibilityTier::Tier1, false),
        (AuthenticityStatus::Real, TrustTier::Tier2) => (CredibilityTier::Tier2, false),
        (AuthenticityStatus::Real, TrustTier::Tier3 | TrustTier::Unknown) => {
            (CredibilityTier::Tier3, false)
        }
    }
}
