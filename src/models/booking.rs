use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::language::{Language, Localized};

/// Appointment details as submitted from the booking form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewAppointment {
    pub customer_name: String,
    pub booking_date: NaiveDate,
    pub booking_time: String,
    pub customer_phone: String,
    pub payment_method: String,
    pub language: Language,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaveOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Gopay,
    Ovo,
    BankTransfer,
    Cash,
}

impl PaymentMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gopay" => Some(PaymentMethod::Gopay),
            "ovo" => Some(PaymentMethod::Ovo),
            "bank_transfer" => Some(PaymentMethod::BankTransfer),
            "cash" => Some(PaymentMethod::Cash),
            _ => None,
        }
    }

    /// Appointments store the label in the customer's language.
    pub fn label(&self, language: Language) -> &'static str {
        let text = match self {
            PaymentMethod::Gopay => Localized::new("GoPay", "GoPay"),
            PaymentMethod::Ovo => Localized::new("OVO", "OVO"),
            PaymentMethod::BankTransfer => Localized::new("Bank Transfer", "Transfer Bank"),
            PaymentMethod::Cash => Localized::new("Cash at Counter", "Tunai di Loket"),
        };
        text.pick(language)
    }
}
