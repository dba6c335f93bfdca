//! Contact and delivery details that accompany a design submission.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Field-level validation failures, reported in form order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// A required field is empty or whitespace.
    #[error("{0} is required")]
    MissingField(&'static str),
    /// No design artifact was attached.
    #[error("Please create a design first")]
    MissingDesign,
}

/// Who is ordering the design.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserDetails {
    /// Full name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone: String,
    /// Company name, optional.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

/// Where the printed shirt should go.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeliveryDetails {
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// State or region.
    pub state: String,
    /// Postal code.
    pub postal_code: String,
    /// Country.
    pub country: String,
}

/// A complete submission: the flattened design plus both detail blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignSubmission {
    /// PNG artifact as a `data:image/png;base64,...` URI.
    pub design_image: String,
    /// Customer contact details.
    pub user_details: UserDetails,
    /// Delivery address.
    pub delivery_details: DeliveryDetails,
}

fn require(value: &str, field: &'static str) -> Result<(), SubmissionError> {
    if value.trim().is_empty() {
        Err(SubmissionError::MissingField(field))
    } else {
        Ok(())
    }
}

impl UserDetails {
    /// Company name, or `N/A` when absent or blank.
    #[must_use]
    pub fn company_or_na(&self) -> &str {
        self.company
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or("N/A")
    }

    /// Check the required contact fields.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::MissingField`] for the first blank field.
    pub fn validate(&self) -> Result<(), SubmissionError> {
        require(&self.name, "Name")?;
        require(&self.email, "Email")?;
        require(&self.phone, "Phone")
    }
}

impl DeliveryDetails {
    /// Check the required address fields.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::MissingField`] for the first blank field.
    pub fn validate(&self) -> Result<(), SubmissionError> {
        require(&self.address, "Address")?;
        require(&self.city, "City")?;
        require(&self.state, "State")?;
        require(&self.postal_code, "Postal code")?;
        require(&self.country, "Country")
    }
}

impl DesignSubmission {
    /// Validate the design and every required field, user details first.
    ///
    /// # Errors
    ///
    /// Returns the first failure in form order.
    pub fn validate(&self) -> Result<(), SubmissionError> {
        if self.design_image.trim().is_empty() {
            return Err(SubmissionError::MissingDesign);
        }
        self.user_details.validate()?;
        self.delivery_details.validate()
    }

    /// Email subject line for this submission.
    #[must_use]
    pub fn subject(&self) -> String {
        format!(
            "New T-Shirt Design Submission from {}",
            self.user_details.name.trim()
        )
    }
}
