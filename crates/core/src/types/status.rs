//! Order status.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Progress of an order through fulfilment.
///
/// The CMS stores this as a free-form string (`status_O`). Unknown values are
/// read as [`OrderStatus::Pending`] so that an order always sits on a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
}

impl OrderStatus {
    /// All stages in fulfilment order.
    pub const STAGES: [Self; 4] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
    ];

    /// Position of this status in [`Self::STAGES`] (0-based).
    #[must_use]
    pub const fn stage_index(self) -> usize {
        match self {
            Self::Pending => 0,
            Self::Processing => 1,
            Self::Shipped => 2,
            Self::Delivered => 3,
        }
    }

    /// Parse a CMS status string, falling back to `Pending`.
    #[must_use]
    pub fn from_cms(value: &str) -> Self {
        match value.trim() {
            "Processing" => Self::Processing,
            "Shipped" => Self::Shipped,
            "Delivered" => Self::Delivered,
            _ => Self::Pending,
        }
    }

    /// The string the CMS expects.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map_or(Self::Pending, Self::from_cms))
    }
}
