//! Open Banking domestic payments file (JSON)
//!
//! ```json
//! {
//!   "Data": {
//!     "DomesticPayments": [
//!       {
//!         "InstructionIdentification": "ANSM023",
//!         "EndToEndIdentification": "FRESCO.21302.GFX.37",
//!         "InstructedAmount": { "Amount": "20.00", "Currency": "GBP" },
//!         "CreditorAccount": {
//!           "SchemeName": "UK.OBIE.SortCodeAccountNumber",
//!           "Identification": "08080021325698",
//!           "Name": "ACME Inc"
//!         },
//!         "RemittanceInformation": { "Reference": "FRESCO-037", "Unstructured": "Internal ops code 5120103" }
//!       }
//!     ]
//!   }
//! }
//! ```
//!
//! The envelope is parsed first; entries are then decoded one by one and the
//! first entry that does not fit the expected shape fails the whole file.

use super::{non_blank, parse_amount, parse_currency, required, utf8_content, PaymentFileDecoder};
use crate::decoded::{DecodedFile, DecodedFileBuilder};
use crate::error::DecodeError;
use crate::types::{CanonicalPayment, FileType, InstructedAmount, PaymentStatus};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PaymentFile {
    data: PaymentFileData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PaymentFileData {
    domestic_payments: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DomesticPayment {
    instruction_identification: String,
    end_to_end_identification: String,
    instructed_amount: ActiveOrHistoricCurrencyAndAmount,
    creditor_account: CashAccount,
    #[serde(default)]
    remittance_information: Option<RemittanceInformation>,
}

/// Amounts are strings on the wire; a JSON number is rejected by the type
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ActiveOrHistoricCurrencyAndAmount {
    amount: String,
    currency: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CashAccount {
    scheme_name: String,
    identification: Option<String>,
    #[serde(default)]
    secondary_identification: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RemittanceInformation {
    reference: Option<String>,
    unstructured: Option<String>,
}

/// Decoder for `Data.DomesticPayments` JSON files
#[derive(Debug, Default, Clone, Copy)]
pub struct DomesticPaymentsJsonDecoder;

impl PaymentFileDecoder for DomesticPaymentsJsonDecoder {
    fn name(&self) -> &'static str {
        "domestic-payments-json"
    }

    fn decode(&self, file_type: FileType, content: &[u8]) -> Result<DecodedFile, DecodeError> {
        let json = utf8_content(content)?;
        let file: PaymentFile = serde_json::from_str(json)?;

        let mut builder = DecodedFileBuilder::new(file_type);
        let decoded_at = builder.decoded_at();
        for (index, entry) in file.data.domestic_payments.into_iter().enumerate() {
            let payment = serde_json::from_value::<DomesticPayment>(entry)
                .map_err(DecodeError::from)
                .and_then(|p| convert_payment(index, p, decoded_at))
                .map_err(|e| e.at_entry(index))?;
            builder.push(payment)?;
        }

        Ok(builder.finish())
    }
}

fn convert_payment(
    index: usize,
    payment: DomesticPayment,
    decoded_at: DateTime<Utc>,
) -> Result<CanonicalPayment, DecodeError> {
    let path = format!("Data.DomesticPayments[{}]", index);

    let instruction_id = required(
        &format!("{}.InstructionIdentification", path),
        Some(payment.instruction_identification.as_str()),
    )?;
    let end_to_end_id = required(
        &format!("{}.EndToEndIdentification", path),
        Some(payment.end_to_end_identification.as_str()),
    )?;

    let amount = parse_amount(
        &format!("{}.InstructedAmount.Amount", path),
        &payment.instructed_amount.amount,
    )?;
    let currency = parse_currency(
        &format!("{}.InstructedAmount.Currency", path),
        &payment.instructed_amount.currency,
    )?;

    let account = &payment.creditor_account;
    let creditor_account_identifier = match non_blank(account.identification.as_deref())
        .or_else(|| non_blank(account.secondary_identification.as_deref()))
    {
        Some(id) => id.to_string(),
        None => {
            return Err(DecodeError::MissingField(format!(
                "{}.CreditorAccount.Identification",
                path
            )))
        }
    };
    let creditor_account_scheme = required(
        &format!("{}.CreditorAccount.SchemeName", path),
        Some(account.scheme_name.as_str()),
    )?;

    let remittance = payment.remittance_information.unwrap_or_default();

    Ok(CanonicalPayment {
        instruction_id,
        end_to_end_id,
        instructed_amount: InstructedAmount { amount, currency },
        creditor_account_identifier,
        creditor_account_scheme,
        remittance_reference: non_blank(remittance.reference.as_deref())
            .unwrap_or_default()
            .to_string(),
        remittance_unstructured: non_blank(remittance.unstructured.as_deref())
            .unwrap_or_default()
            .to_string(),
        created_at: decoded_at,
        status: PaymentStatus::Pending,
    })
}
