//! Lender market data model: the listing records offered to a borrower and
//! the rate-sorted view consumed by the allocation engine.

use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

/// One capital source in a market listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lender {
    /// Identifier, assumed unique within a listing
    pub name: String,
    /// Annual rate as a decimal (0.07 = 7%)
    pub rate: Rate,
    /// Capital on offer at load time
    pub available: Money,
}

impl Lender {
    pub fn new(name: impl Into<String>, rate: Rate, available: Money) -> Self {
        Lender {
            name: name.into(),
            rate,
            available,
        }
    }
}

/// The full set of lenders competing to fund one loan request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub lenders: Vec<Lender>,
}

impl Market {
    pub fn new(lenders: Vec<Lender>) -> Self {
        Market { lenders }
    }

    /// Total capital on offer across the listing.
    pub fn total_available(&self) -> Money {
        self.lenders.iter().map(|l| l.available).sum()
    }

    /// Lenders ascending by rate. The sort is stable: ties keep their
    /// listing order.
    pub fn rate_sorted(&self) -> Vec<Lender> {
        let mut sorted = self.lenders.clone();
        sorted.sort_by(|a, b| a.rate.cmp(&b.rate));
        sorted
    }

    pub fn len(&self) -> usize {
        self.lenders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lenders.is_empty()
    }
}
