//! Facet value types
//!
//! Each facet has a zero value meaning "no filter". Zero values are never
//! written to the URL and never sent to the backend.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal used by URLs and menus for "any value"
pub const ALL: &str = "all";

/// Brand facet
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Brand {
    /// Any brand
    #[default]
    All,
    /// One named brand
    Named(String),
}

impl Brand {
    /// Normalize shopper or URL input
    ///
    /// Blank input and `all` (any case) both mean [`Brand::All`].
    #[must_use]
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL) {
            Self::All
        } else {
            Self::Named(trimmed.to_string())
        }
    }

    /// Same normalization as [`Brand::from_input`] applied to an existing value
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            Self::All => Self::All,
            Self::Named(name) => Self::from_input(&name),
        }
    }

    /// Brand name when one is selected
    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Named(name) => Some(name),
        }
    }

    /// Check if a brand is selected
    #[inline]
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl fmt::Display for Brand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name().unwrap_or(ALL))
    }
}

/// Multiplier from preset price units to store currency
pub const PRICE_UNIT: u64 = 1_000;

/// Preset price band
///
/// Presets are expressed in thousands of the store currency, so
/// `500-1000` means 500 000 to 1 000 000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PriceRange {
    /// Any price
    #[default]
    All,
    /// Up to 500
    Under500,
    /// 500 to 1000
    From500To1000,
    /// 1000 to 2000
    From1000To2000,
    /// 2000 to 5000
    From2000To5000,
    /// 5000 and above
    Over5000,
}

impl PriceRange {
    /// Every preset, in menu order
    pub const ALL: [PriceRange; 6] = [
        PriceRange::All,
        PriceRange::Under500,
        PriceRange::From500To1000,
        PriceRange::From1000To2000,
        PriceRange::From2000To5000,
        PriceRange::Over5000,
    ];

    /// URL id of this preset
    #[must_use]
    pub fn as_id(self) -> &'static str {
        match self {
            Self::All => ALL,
            Self::Under500 => "0-500",
            Self::From500To1000 => "500-1000",
            Self::From1000To2000 => "1000-2000",
            Self::From2000To5000 => "2000-5000",
            Self::Over5000 => "5000+",
        }
    }

    /// Parse a URL id; `None` for unknown ids
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|range| range.as_id() == id)
    }

    /// Inclusive `(priceMin, priceMax)` in store currency
    #[must_use]
    pub fn bounds(self) -> (Option<u64>, Option<u64>) {
        let (min, max) = match self {
            Self::All => (None, None),
            Self::Under500 => (None, Some(500)),
            Self::From500To1000 => (Some(500), Some(1_000)),
            Self::From1000To2000 => (Some(1_000), Some(2_000)),
            Self::From2000To5000 => (Some(2_000), Some(5_000)),
            Self::Over5000 => (Some(5_000), None),
        };
        (min.map(|v| v * PRICE_UNIT), max.map(|v| v * PRICE_UNIT))
    }
}

/// Minimum star rating, 1 to 5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RatingFloor(u8);

impl RatingFloor {
    /// Highest possible floor
    pub const MAX: u8 = 5;

    /// Create a floor; 0 means "no filter" and yields `None`, as does
    /// anything above five
    #[must_use]
    pub fn new(stars: u8) -> Option<Self> {
        (1..=Self::MAX).contains(&stars).then_some(Self(stars))
    }

    /// Parse a URL id
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        id.trim().parse().ok().and_then(Self::new)
    }

    /// Star count
    #[inline]
    #[must_use]
    pub fn stars(self) -> u8 {
        self.0
    }
}

/// Preset discount band for the flash-sale surface (percent)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DiscountRange {
    /// Any discount
    #[default]
    All,
    /// 10 to 30 percent off
    From10To30,
    /// 30 to 50 percent off
    From30To50,
    /// 50 to 70 percent off
    From50To70,
    /// 70 percent off or more
    Over70,
}

impl DiscountRange {
    /// Every preset, in menu order
    pub const ALL: [DiscountRange; 5] = [
        DiscountRange::All,
        DiscountRange::From10To30,
        DiscountRange::From30To50,
        DiscountRange::From50To70,
        DiscountRange::Over70,
    ];

    /// URL id of this preset
    #[must_use]
    pub fn as_id(self) -> &'static str {
        match self {
            Self::All => ALL,
            Self::From10To30 => "10-30",
            Self::From30To50 => "30-50",
            Self::From50To70 => "50-70",
            Self::Over70 => "70+",
        }
    }

    /// Parse a URL id; `None` for unknown ids
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|range| range.as_id() == id)
    }

    /// Inclusive `(discountMin, discountMax)` in percent
    #[must_use]
    pub fn bounds(self) -> (Option<u8>, Option<u8>) {
        match self {
            Self::All => (None, None),
            Self::From10To30 => (Some(10), Some(30)),
            Self::From30To50 => (Some(30), Some(50)),
            Self::From50To70 => (Some(50), Some(70)),
            Self::Over70 => (Some(70), None),
        }
    }
}

/// Normalize a search keyword; blank input clears it
#[must_use]
pub fn normalize_keyword(input: &str) -> Option<String> {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_all_is_never_named() {
        assert_eq!(Brand::from_input("all"), Brand::All);
        assert_eq!(Brand::from_input(" ALL "), Brand::All);
        assert_eq!(Brand::from_input(""), Brand::All);
        assert_eq!(Brand::from_input(" Acme "), Brand::Named("Acme".into()));
        assert_eq!(Brand::All.name(), None);
    }

    #[test]
    fn price_presets_scale_to_currency() {
        assert_eq!(
            PriceRange::from_id("500-1000").unwrap().bounds(),
            (Some(500_000), Some(1_000_000))
        );
        assert_eq!(PriceRange::from_id("all").unwrap().bounds(), (None, None));
        assert_eq!(PriceRange::Over5000.bounds(), (Some(5_000_000), None));
        assert_eq!(PriceRange::from_id("500-999"), None);
    }

    #[test]
    fn rating_zero_means_no_filter() {
        assert_eq!(RatingFloor::new(0), None);
        assert_eq!(RatingFloor::new(6), None);
        assert_eq!(RatingFloor::from_id("4").map(RatingFloor::stars), Some(4));
        assert_eq!(RatingFloor::from_id("four"), None);
    }

    #[test]
    fn discount_presets() {
        assert_eq!(DiscountRange::from_id("30-50").unwrap().bounds(), (Some(30), Some(50)));
        assert_eq!(DiscountRange::from_id("90+"), None);
    }

    #[test]
    fn keyword_is_collapsed() {
        assert_eq!(normalize_keyword("  red   shoes "), Some("red shoes".into()));
        assert_eq!(normalize_keyword("   "), None);
    }
}
