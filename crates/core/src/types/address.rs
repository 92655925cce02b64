//! Delivery address and the fixed delivery area.

use serde::{Deserialize, Serialize};

/// Minimum number of digits a contact phone must contain.
const MIN_PHONE_DIGITS: usize = 6;

/// Errors that can occur when validating an address.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Street is blank.
    #[error("street is required")]
    MissingStreet,
    /// Postal code is blank.
    #[error("postal code is required")]
    MissingZipCode,
    /// Postal code contains unexpected characters.
    #[error("postal code may only contain letters, digits, spaces and hyphens")]
    InvalidZipCode,
    /// Phone is blank.
    #[error("contact phone is required")]
    MissingPhone,
    /// Phone contains unexpected characters or too few digits.
    #[error("contact phone must contain at least 6 digits")]
    InvalidPhone,
}

/// A delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub phone: String,
}

impl Address {
    /// Single-line rendering for summaries.
    #[must_use]
    pub fn one_line(&self) -> String {
        format!(
            "{}, {}, {} {}, {}",
            self.street, self.city, self.state, self.zip_code, self.country
        )
    }
}

/// The fields a shopper fills in; the rest come from the [`DeliveryArea`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressForm {
    pub street: String,
    pub zip_code: String,
    pub phone: String,
}

impl From<&Address> for AddressForm {
    fn from(address: &Address) -> Self {
        Self {
            street: address.street.clone(),
            zip_code: address.zip_code.clone(),
            phone: address.phone.clone(),
        }
    }
}

/// The area the bakery delivers to.
///
/// Deliveries are limited to a single city, so city, state and country are
/// fixed rather than entered by the shopper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryArea {
    pub city: String,
    pub state: String,
    pub country: String,
}

impl Default for DeliveryArea {
    fn default() -> Self {
        Self {
            city: "Lima".to_string(),
            state: "Lima".to_string(),
            country: "Perú".to_string(),
        }
    }
}

impl DeliveryArea {
    /// Validate a submitted form and complete it into a full address.
    ///
    /// # Errors
    ///
    /// Returns an `AddressError` describing the first invalid field.
    pub fn address(&self, form: &AddressForm) -> Result<Address, AddressError> {
        let street = form.street.trim();
        if street.is_empty() {
            return Err(AddressError::MissingStreet);
        }

        let zip_code = form.zip_code.trim();
        if zip_code.is_empty() {
            return Err(AddressError::MissingZipCode);
        }
        if !zip_code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-')
        {
            return Err(AddressError::InvalidZipCode);
        }

        let phone = form.phone.trim();
        if phone.is_empty() {
            return Err(AddressError::MissingPhone);
        }
        let allowed = |c: char| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')');
        let digits = phone.chars().filter(char::is_ascii_digit).count();
        if !phone.chars().all(allowed) || digits < MIN_PHONE_DIGITS {
            return Err(AddressError::InvalidPhone);
        }

        Ok(Address {
            street: street.to_string(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip_code: zip_code.to_string(),
            country: self.country.clone(),
            phone: phone.to_string(),
        })
    }
}
