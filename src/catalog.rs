//! # Product Catalog and Identity Resolution
//!
//! Every upstream system names products differently. The storefront encodes
//! identity in price (several skus share a label), while the card ledger and
//! CRM carry verbose free-text descriptions. Resolution therefore runs in two
//! tiers:
//!
//! 1. **Price table** for storefront-origin purchases (and CRM labels using the
//!    generic `" - Order"` wording), with a text check for the ambiguous $197 tier.
//! 2. **Exact label table** covering each system's literal wording.
//!
//! Anything left over passes through as [`ProductIdentity::Unrecognized`]; the
//! resolver never fails.

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::Origin;

/// Substring marking a CRM label that carries no product wording of its own.
const GENERIC_ORDER_MARKER: &str = " - Order";

/// Label of the discounted Launchpad offer that is paid in two installments.
pub const SPLIT_PAY_LABEL: &str = "Fast-Start - 7-Figure Launchpad Discounted";

// ============================================================================
// Canonical Products
// ============================================================================

/// The fixed set of products the refund desk knows how to reason about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalProduct {
    FastStart,
    EndlessVideoIdeas,
    /// Single ledger charge covering Fast-Start plus the Endless Video Ideas bump.
    FastStartWithEndlessVideoIdeas,
    ChannelBrandKit,
    SevenFigureLaunchpad,
    SevenFigureLaunchpadWithLaunchFormula,
    IncomeStreamBundle,
    CopyPaste,
    AiViralityBot,
}

impl CanonicalProduct {
    pub const ALL: [CanonicalProduct; 9] = [
        CanonicalProduct::FastStart,
        CanonicalProduct::EndlessVideoIdeas,
        CanonicalProduct::FastStartWithEndlessVideoIdeas,
        CanonicalProduct::ChannelBrandKit,
        CanonicalProduct::SevenFigureLaunchpad,
        CanonicalProduct::SevenFigureLaunchpadWithLaunchFormula,
        CanonicalProduct::IncomeStreamBundle,
        CanonicalProduct::CopyPaste,
        CanonicalProduct::AiViralityBot,
    ];

    /// Display name shown to customers and support staff.
    pub fn name(self) -> &'static str {
        match self {
            CanonicalProduct::FastStart => "Fast-Start",
            CanonicalProduct::EndlessVideoIdeas => "Endless Video Ideas",
            CanonicalProduct::FastStartWithEndlessVideoIdeas => "Fast-Start + Endless Video Ideas",
            CanonicalProduct::ChannelBrandKit => "Channel Brand Kit",
            CanonicalProduct::SevenFigureLaunchpad => "7-Figure Launchpad",
            CanonicalProduct::SevenFigureLaunchpadWithLaunchFormula => {
                "7-Figure Launchpad + The $10k Launch Formula"
            }
            CanonicalProduct::IncomeStreamBundle => "Income Stream Bundle",
            CanonicalProduct::CopyPaste => "Copy-paste",
            CanonicalProduct::AiViralityBot => "AI Virality Bot",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Constituent products of a compound charge, with their fixed sub-prices.
    pub fn constituents(self) -> Option<[(CanonicalProduct, Decimal); 2]> {
        match self {
            CanonicalProduct::FastStartWithEndlessVideoIdeas => Some([
                (CanonicalProduct::FastStart, Decimal::from(27)),
                (CanonicalProduct::EndlessVideoIdeas, Decimal::from(47)),
            ]),
            _ => None,
        }
    }
}

impl fmt::Display for CanonicalProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Product Identity
// ============================================================================

/// Result of resolving a raw upstream label.
///
/// Serializes as a plain string so unrecognized labels surface verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProductIdentity {
    Canonical(CanonicalProduct),
    Unrecognized(String),
}

impl ProductIdentity {
    pub fn name(&self) -> &str {
        match self {
            ProductIdentity::Canonical(product) => product.name(),
            ProductIdentity::Unrecognized(raw) => raw,
        }
    }

    pub fn canonical(&self) -> Option<CanonicalProduct> {
        match self {
            ProductIdentity::Canonical(product) => Some(*product),
            ProductIdentity::Unrecognized(_) => None,
        }
    }

    pub fn is(&self, product: CanonicalProduct) -> bool {
        self.canonical() == Some(product)
    }
}

impl From<CanonicalProduct> for ProductIdentity {
    fn from(product: CanonicalProduct) -> Self {
        ProductIdentity::Canonical(product)
    }
}

impl fmt::Display for ProductIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for ProductIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for ProductIdentity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(match CanonicalProduct::from_name(&name) {
            Some(product) => ProductIdentity::Canonical(product),
            None => ProductIdentity::Unrecognized(name),
        })
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve a raw, source-specific label to a product identity.
///
/// `price` and `origin` are hints; price mapping only applies to
/// storefront-origin purchases or CRM labels in the generic order format.
pub fn resolve(raw_label: &str, price: Option<Decimal>, origin: Option<Origin>) -> ProductIdentity {
    if uses_price_mapping(raw_label, origin) {
        if let Some(product) = price.and_then(|p| by_price(raw_label, p)) {
            return product.into();
        }
    }

    match by_label(raw_label) {
        Some(product) => product.into(),
        None => ProductIdentity::Unrecognized(raw_label.to_string()),
    }
}

fn uses_price_mapping(raw_label: &str, origin: Option<Origin>) -> bool {
    match origin {
        Some(Origin::Storefront) => true,
        Some(Origin::Crm) => raw_label.contains(GENERIC_ORDER_MARKER),
        None => false,
    }
}

/// Price tier lookup. Only whole-dollar amounts have an entry.
fn by_price(raw_label: &str, price: Decimal) -> Option<CanonicalProduct> {
    if !price.fract().is_zero() {
        return None;
    }

    match price.to_u32()? {
        27 => Some(CanonicalProduct::FastStart),
        47 => Some(CanonicalProduct::EndlessVideoIdeas),
        74 => Some(CanonicalProduct::FastStartWithEndlessVideoIdeas),
        97 => Some(CanonicalProduct::ChannelBrandKit),
        147 => Some(CanonicalProduct::SevenFigureLaunchpad),
        197 if raw_label.to_lowercase().contains("income stream bundle") => {
            Some(CanonicalProduct::IncomeStreamBundle)
        }
        197 => Some(CanonicalProduct::SevenFigureLaunchpad),
        297 => Some(CanonicalProduct::SevenFigureLaunchpadWithLaunchFormula),
        _ => None,
    }
}

/// Exact wording used by the storefront, card ledger and CRM checkout pages.
fn by_label(raw_label: &str) -> Option<CanonicalProduct> {
    use CanonicalProduct::*;

    let product = match raw_label {
        "Copy Paste Channel ($695 option)" | "Copy Paste Channel ($995 option)" => CopyPaste,

        "Faceless Income 5-day Fast Start" | "Faceless Income 5-day Fast Start ($27)" => FastStart,

        "Faceless Income 5-day Fast Start ($27) + Endless Video Ideas System ($47)" => {
            FastStartWithEndlessVideoIdeas
        }

        "Endless Video Ideas System ($47)" | "Endless Video Ideas System" => EndlessVideoIdeas,

        "7-Figure Launchpad"
        | "7-Figure Launchpad Discounted"
        | "Fast-Start - 7-Figure Launchpad Discounted"
        | "7-Figure Launchpad ($197)"
        | "Fast-Start - 7-Figure Launchpad Discounted  ($147)"
        // Ledger's generic wording for the $147 subscription charge
        | "Subscription creation" => SevenFigureLaunchpad,

        "7-Figure Launchpad + The $10k Launch Formula"
        | "7-Figure Launchpad + The $10k Launch Formula ($297)" => {
            SevenFigureLaunchpadWithLaunchFormula
        }

        "Fast-start - Income Stream Bundle"
        | "Income Stream Bundle"
        | "Income Stream Bundle (2x)"
        | "Fast-start - Income Stream Bundle ($197)" => IncomeStreamBundle,

        "Fast-start - The Faceless Brand Kit"
        | "Channel Brand Kit"
        | "Fast-start - The Faceless Brand Kit ($97)" => ChannelBrandKit,

        "AI Virality Bot" => AiViralityBot,

        other => return CanonicalProduct::from_name(other),
    };

    Some(product)
}

/// Whether a raw label names the two-installment discounted Launchpad offer.
///
/// A trailing price tag such as `"  ($147)"` is ignored.
pub fn is_split_pay_label(raw_label: &str) -> bool {
    strip_price_suffix(raw_label).trim_end() == SPLIT_PAY_LABEL
}

fn strip_price_suffix(label: &str) -> &str {
    let trimmed = label.trim_end();
    match trimmed.rfind(" ($") {
        Some(pos) if trimmed.ends_with(')') => &trimmed[..pos],
        _ => trimmed,
    }
}
