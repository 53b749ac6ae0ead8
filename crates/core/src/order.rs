//! Checkout form and placed orders.

use core::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::CartLine;
use crate::types::{DocumentId, OrderId, OrderStatus, ProductId, UserId};

/// Country preselected on the checkout form.
pub const DEFAULT_COUNTRY: &str = "Egypt";

/// Cities the store delivers to. The first is the default.
pub const SUPPORTED_CITIES: [&str; 10] = [
    "Cairo",
    "Giza",
    "Alexandria",
    "Aswan",
    "Luxor",
    "Mansoura",
    "Zagazig",
    "Tanta",
    "Suez",
    "Port Said",
];

/// How the shopper intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "Cash on Delivery")]
    CashOnDelivery,
    #[serde(rename = "Credit Card")]
    CreditCard,
}

impl PaymentMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "Cash on Delivery",
            Self::CreditCard => "Credit Card",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash on delivery" | "cod" | "cash" => Ok(Self::CashOnDelivery),
            "credit card" | "card" => Ok(Self::CreditCard),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// A checkout form field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutFormError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("we do not deliver to {0}")]
    UnsupportedCity(String),
}

/// Shipping and payment details entered at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    pub customer_name: Option<String>,
    pub phone_number: String,
    pub shipping_address: String,
    pub country: String,
    pub city: String,
    pub payment_method: PaymentMethod,
}

impl Default for CheckoutForm {
    fn default() -> Self {
        Self {
            customer_name: None,
            phone_number: String::new(),
            shipping_address: String::new(),
            country: DEFAULT_COUNTRY.to_string(),
            city: SUPPORTED_CITIES[0].to_string(),
            payment_method: PaymentMethod::default(),
        }
    }
}

impl CheckoutForm {
    /// Trim fields and check the required ones.
    ///
    /// # Errors
    ///
    /// Fails when the phone number or address is blank, or the city is not
    /// one of [`SUPPORTED_CITIES`].
    pub fn validate(mut self) -> Result<Self, CheckoutFormError> {
        self.phone_number = self.phone_number.trim().to_string();
        self.shipping_address = self.shipping_address.trim().to_string();
        self.customer_name = self
            .customer_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        if self.phone_number.is_empty() {
            return Err(CheckoutFormError::MissingField("phone number"));
        }
        if self.shipping_address.is_empty() {
            return Err(CheckoutFormError::MissingField("shipping address"));
        }

        let city = self.city.trim();
        let Some(city) = SUPPORTED_CITIES
            .iter()
            .find(|c| c.eq_ignore_ascii_case(city))
        else {
            return Err(CheckoutFormError::UnsupportedCity(city.to_string()));
        };
        self.city = (*city).to_string();

        if self.country.trim().is_empty() {
            self.country = DEFAULT_COUNTRY.to_string();
        }
        Ok(self)
    }
}

/// A cart line as recorded on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub size: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl From<&CartLine> for OrderItem {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id,
            name: line.name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
            size: line.size.clone(),
            image_url: line.image_url.clone(),
        }
    }
}

/// An order ready to be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub form: CheckoutForm,
    pub items: Vec<OrderItem>,
    pub grand_total: Decimal,
    pub status: OrderStatus,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub document_id: Option<DocumentId>,
    pub customer_name: Option<String>,
    pub phone_number: String,
    pub shipping_address: String,
    pub country: String,
    pub city: String,
    pub payment_method: String,
    pub items: Vec<OrderItem>,
    pub grand_total: Decimal,
    pub status: OrderStatus,
    pub created_at: Option<DateTime<Utc>>,
}
