//! Refund eligibility windows per product.
//!
//! Elapsed time is measured in UTC milliseconds. The window is open only while
//! `0 < now - purchased_at < window`, so a purchase dated in the future is never
//! refundable and the exact window boundary is already closed.

use chrono::{DateTime, Utc};

use crate::catalog::{CanonicalProduct, ProductIdentity};

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;

const GUARANTEE_EXPIRED: &str = "Your 365-day money-back guarantee period has expired.";

/// Refund policy attached to a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundWindow {
    /// 24 hour cool-off period.
    CoolOff,
    /// 14 day refund period.
    TwoWeeks,
    /// 365 day money-back guarantee.
    Guarantee,
    Never,
    /// Products without a policy entry stay refundable.
    Unrestricted,
}

impl RefundWindow {
    pub fn for_product(product: &ProductIdentity) -> Self {
        use CanonicalProduct::*;

        match product.canonical() {
            Some(EndlessVideoIdeas) => RefundWindow::CoolOff,
            Some(SevenFigureLaunchpad | SevenFigureLaunchpadWithLaunchFormula) => {
                RefundWindow::TwoWeeks
            }
            Some(FastStart | CopyPaste | IncomeStreamBundle | ChannelBrandKit) => {
                RefundWindow::Guarantee
            }
            // widest window of its parts: Fast-Start's guarantee outlasts the cool-off
            Some(FastStartWithEndlessVideoIdeas) => RefundWindow::Guarantee,
            Some(AiViralityBot) => RefundWindow::Never,
            None => RefundWindow::Unrestricted,
        }
    }

    fn length_ms(self) -> Option<i64> {
        match self {
            RefundWindow::CoolOff => Some(DAY_MS),
            RefundWindow::TwoWeeks => Some(14 * DAY_MS),
            RefundWindow::Guarantee => Some(365 * DAY_MS),
            RefundWindow::Never | RefundWindow::Unrestricted => None,
        }
    }

    pub fn allows(self, purchased_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            RefundWindow::Never => false,
            RefundWindow::Unrestricted => true,
            window => {
                let elapsed = now.timestamp_millis() - purchased_at.timestamp_millis();
                window
                    .length_ms()
                    .is_some_and(|length| elapsed > 0 && elapsed < length)
            }
        }
    }

    /// Customer-facing explanation shown when the window is closed.
    pub fn closed_reason(self) -> Option<&'static str> {
        match self {
            RefundWindow::CoolOff => {
                Some("Your 24 Hour Cooldown Period for Endless Video Ideas System has already passed.")
            }
            RefundWindow::TwoWeeks => Some("Refunds only available within 14 days of purchase."),
            RefundWindow::Guarantee => Some(GUARANTEE_EXPIRED),
            RefundWindow::Never => Some("Refunds for Virality AI are not available after purchase."),
            RefundWindow::Unrestricted => None,
        }
    }
}

/// Eligibility verdict for one purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eligibility {
    pub refundable: bool,
    pub reason: Option<&'static str>,
}

pub fn assess(product: &ProductIdentity, purchased_at: DateTime<Utc>, now: DateTime<Utc>) -> Eligibility {
    let window = RefundWindow::for_product(product);
    let refundable = window.allows(purchased_at, now);
    Eligibility {
        refundable,
        reason: if refundable { None } else { window.closed_reason() },
    }
}

pub fn is_refundable(product: &ProductIdentity, purchased_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    RefundWindow::for_product(product).allows(purchased_at, now)
}
