//! pain.001 - Customer Credit Transfer Initiation
//!
//! Decodes `Document/CstmrCdtTrfInitn`: one group header followed by one or
//! more `PmtInf` blocks, each holding one or more `CdtTrfTxInf` entries.
//! `GrpHdr/NbOfTxs` and `GrpHdr/CtrlSum` are read only to log a warning when
//! they disagree with the entries actually present.

use super::{non_blank, parse_amount, parse_currency, required, utf8_content, PaymentFileDecoder};
use crate::decoded::{DecodedFile, DecodedFileBuilder};
use crate::error::DecodeError;
use crate::types::{CanonicalPayment, FileType, InstructedAmount, PaymentStatus};
use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

const ROOT_ELEMENT: &str = "Document";

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(rename = "CstmrCdtTrfInitn")]
    customer_credit_transfer_initiation: CustomerCreditTransferInitiation,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CustomerCreditTransferInitiation {
    grp_hdr: Option<GroupHeader>,
    #[serde(rename = "PmtInf")]
    payment_information: Vec<PaymentInformation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GroupHeader {
    nb_of_txs: Option<String>,
    ctrl_sum: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PaymentInformation {
    pmt_inf_id: Option<String>,
    #[serde(rename = "CdtTrfTxInf")]
    credit_transfer_tx_info: Vec<CreditTransferTransactionInformation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreditTransferTransactionInformation {
    pmt_id: Option<PaymentIdentification>,
    amt: Option<Amount>,
    cdtr_acct: Option<Account>,
    rmt_inf: Option<RemittanceInformation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PaymentIdentification {
    instr_id: Option<String>,
    end_to_end_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Amount {
    #[serde(rename = "InstdAmt")]
    instructed_amount: Option<CurrencyAndAmount>,
}

#[derive(Debug, Deserialize)]
struct CurrencyAndAmount {
    #[serde(rename = "@Ccy")]
    currency: Option<String>,
    #[serde(rename = "$text")]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Account {
    id: Option<AccountIdentification>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AccountIdentification {
    #[serde(rename = "IBAN")]
    iban: Option<String>,
    othr: Option<GenericAccountIdentification>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GenericAccountIdentification {
    id: Option<String>,
    schme_nm: Option<SchemeName>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SchemeName {
    cd: Option<String>,
    prtry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RemittanceInformation {
    #[serde(default)]
    ustrd: Vec<String>,
    #[serde(default)]
    strd: Vec<StructuredRemittanceInformation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StructuredRemittanceInformation {
    cdtr_ref_inf: Option<CreditorReferenceInformation>,
}

#[derive(Debug, Deserialize)]
struct CreditorReferenceInformation {
    #[serde(rename = "Ref")]
    reference: Option<String>,
}

/// ISO 20022 pain.001 XML decoder
#[derive(Debug, Default, Clone, Copy)]
pub struct Pain001Decoder;

impl PaymentFileDecoder for Pain001Decoder {
    fn name(&self) -> &'static str {
        "pain.001"
    }

    fn decode(&self, file_type: FileType, content: &[u8]) -> Result<DecodedFile, DecodeError> {
        let xml = utf8_content(content)?;
        check_root_element(xml)?;
        let document: Document = from_str(xml)?;
        let initiation = document.customer_credit_transfer_initiation;

        let mut builder = DecodedFileBuilder::new(file_type);
        for (p, pmt_inf) in initiation.payment_information.iter().enumerate() {
            for (t, tx_inf) in pmt_inf.credit_transfer_tx_info.iter().enumerate() {
                let path = format!("PmtInf[{}]/CdtTrfTxInf[{}]", p, t);
                let payment = convert_transaction(&path, pmt_inf, tx_inf, builder.decoded_at())?;
                builder.push(payment)?;
            }
        }

        if let Some(grp_hdr) = &initiation.grp_hdr {
            check_group_header(grp_hdr, &builder);
        }

        Ok(builder.finish())
    }
}

/// The serde layer ignores the root element name, so check it up front
fn check_root_element(xml: &str) -> Result<(), DecodeError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event().map_err(quick_xml::DeError::from)? {
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => continue,
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == ROOT_ELEMENT.as_bytes() => {
                return Ok(())
            }
            _ => return Err(DecodeError::MissingField(ROOT_ELEMENT.to_string())),
        }
    }
}

fn convert_transaction(
    path: &str,
    pmt_inf: &PaymentInformation,
    tx_inf: &CreditTransferTransactionInformation,
    decoded_at: DateTime<Utc>,
) -> Result<CanonicalPayment, DecodeError> {
    let pmt_id = tx_inf
        .pmt_id
        .as_ref()
        .ok_or_else(|| DecodeError::MissingField(format!("{}/PmtId", path)))?;

    let end_to_end_id = required(
        &format!("{}/PmtId/EndToEndId", path),
        pmt_id.end_to_end_id.as_deref(),
    )?;

    // InstrId is optional in pain.001; the payment information block id stands in
    let instruction_id = match non_blank(pmt_id.instr_id.as_deref()) {
        Some(id) => id.to_string(),
        None => required(
            &format!("{}/PmtId/InstrId", path),
            pmt_inf.pmt_inf_id.as_deref(),
        )?,
    };

    let amount_path = format!("{}/Amt/InstdAmt", path);
    let instd_amt = tx_inf
        .amt
        .as_ref()
        .and_then(|amt| amt.instructed_amount.as_ref())
        .ok_or_else(|| DecodeError::MissingField(amount_path.clone()))?;
    let amount = parse_amount(
        &amount_path,
        &required(&amount_path, instd_amt.value.as_deref())?,
    )?;
    let currency_path = format!("{}@Ccy", amount_path);
    let currency = parse_currency(
        &currency_path,
        &required(&currency_path, instd_amt.currency.as_deref())?,
    )?;

    let (creditor_account_identifier, creditor_account_scheme) =
        creditor_account(path, tx_inf.cdtr_acct.as_ref())?;

    let rmt_inf = tx_inf.rmt_inf.as_ref();
    let remittance_reference = rmt_inf
        .and_then(|r| {
            r.strd.iter().find_map(|s| {
                s.cdtr_ref_inf
                    .as_ref()
                    .and_then(|c| non_blank(c.reference.as_deref()))
            })
        })
        .unwrap_or_default()
        .to_string();
    let remittance_unstructured = rmt_inf
        .and_then(|r| non_blank(r.ustrd.first().map(String::as_str)))
        .unwrap_or_default()
        .to_string();

    Ok(CanonicalPayment {
        instruction_id,
        end_to_end_id,
        instructed_amount: InstructedAmount { amount, currency },
        creditor_account_identifier,
        creditor_account_scheme,
        remittance_reference,
        remittance_unstructured,
        created_at: decoded_at,
        status: PaymentStatus::Pending,
    })
}

/// IBAN when present, else `Othr/Id` with its scheme
fn creditor_account(path: &str, account: Option<&Account>) -> Result<(String, String), DecodeError> {
    let id = account
        .and_then(|a| a.id.as_ref())
        .ok_or_else(|| DecodeError::MissingField(format!("{}/CdtrAcct/Id", path)))?;

    if let Some(iban) = non_blank(id.iban.as_deref()) {
        return Ok((iban.to_string(), "IBAN".to_string()));
    }

    let othr = id.othr.as_ref();
    match othr.and_then(|o| non_blank(o.id.as_deref())) {
        Some(other_id) => {
            let scheme = othr
                .and_then(|o| o.schme_nm.as_ref())
                .and_then(|s| non_blank(s.cd.as_deref()).or_else(|| non_blank(s.prtry.as_deref())))
                .unwrap_or("OTHER");
            Ok((other_id.to_string(), scheme.to_string()))
        }
        None => Err(DecodeError::MissingField(format!(
            "{}/CdtrAcct/Id/IBAN",
            path
        ))),
    }
}

fn check_group_header(grp_hdr: &GroupHeader, builder: &DecodedFileBuilder) {
    if let Some(nb_of_txs) = non_blank(grp_hdr.nb_of_txs.as_deref()) {
        if nb_of_txs.parse::<usize>().ok() != Some(builder.len()) {
            tracing::warn!(
                declared = nb_of_txs,
                decoded = builder.len(),
                "pain.001 GrpHdr/NbOfTxs disagrees with decoded entries, ignoring"
            );
        }
    }

    if let Some(ctrl_sum) = non_blank(grp_hdr.ctrl_sum.as_deref()) {
        if parse_amount("GrpHdr/CtrlSum", ctrl_sum).ok() != Some(builder.control_sum()) {
            tracing::warn!(
                declared = ctrl_sum,
                decoded = %builder.control_sum(),
                "pain.001 GrpHdr/CtrlSum disagrees with decoded entries, ignoring"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn tx(instr_id: &str, e2e: &str, amount: &str, account: &str, rmt: &str) -> String {
        format!(
            r#"<CdtTrfTxInf>
        <PmtId><InstrId>{}</InstrId><EndToEndId>{}</EndToEndId></PmtId>
        <Amt><InstdAmt Ccy="GBP">{}</InstdAmt></Amt>
        <CdtrAgt><FinInstnId><BICFI>NWBKGB2L</BICFI></FinInstnId></CdtrAgt>
        <Cdtr><Nm>Creditor</Nm></Cdtr>
        <CdtrAcct><Id>{}</Id></CdtrAcct>
        {}
      </CdtTrfTxInf>"#,
            instr_id, e2e, amount, account, rmt
        )
    }

    fn document(ctrl_sum: &str, txs: &[String]) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Document xmlns="urn:iso:std:iso:20022:tech:xsd:pain.001.001.08">
  <CstmrCdtTrfInitn>
    <GrpHdr>
      <MsgId>MSG-001</MsgId>
      <CreDtTm>2026-10-01T09:00:00</CreDtTm>
      <NbOfTxs>{}</NbOfTxs>
      <CtrlSum>{}</CtrlSum>
      <InitgPty><Nm>ACME Ltd</Nm></InitgPty>
    </GrpHdr>
    <PmtInf>
      <PmtInfId>PMTINF-1</PmtInfId>
      <PmtMtd>TRF</PmtMtd>
      <Dbtr><Nm>ACME Ltd</Nm></Dbtr>
      <DbtrAcct><Id><IBAN>GB33BUKB20201555555555</IBAN></Id></DbtrAcct>
      <DbtrAgt><FinInstnId><BICFI>BUKBGB22</BICFI></FinInstnId></DbtrAgt>
      {}
    </PmtInf>
  </CstmrCdtTrfInitn>
</Document>"#,
            txs.len(),
            ctrl_sum,
            txs.join("\n")
        )
    }

    const IBAN: &str = "<IBAN>GB29NWBK60161331926819</IBAN>";

    fn decode(xml: &str) -> Result<DecodedFile, DecodeError> {
        Pain001Decoder.decode(FileType::Pain001, xml.as_bytes())
    }

    #[test]
    fn test_decode_transactions() {
        let xml = document(
            "30.50",
            &[
                tx(
                    "INSTR-1",
                    "E2E-1",
                    "10.25",
                    IBAN,
                    "<RmtInf><Ustrd>Invoice 42</Ustrd><Ustrd>second line</Ustrd></RmtInf>",
                ),
                tx(
                    "INSTR-2",
                    "E2E-2",
                    "20.25",
                    IBAN,
                    "<RmtInf><Strd><CdtrRefInf><Ref>REF-99</Ref></CdtrRefInf></Strd></RmtInf>",
                ),
            ],
        );

        let file = decode(&xml).unwrap();
        assert_eq!(file.transaction_count(), 2);
        assert_eq!(file.control_sum(), Decimal::from_str("30.50").unwrap());

        let first = &file.payments()[0];
        assert_eq!(first.instruction_id, "INSTR-1");
        assert_eq!(first.end_to_end_id, "E2E-1");
        assert_eq!(first.instructed_amount.currency.as_str(), "GBP");
        assert_eq!(first.creditor_account_identifier, "GB29NWBK60161331926819");
        assert_eq!(first.creditor_account_scheme, "IBAN");
        assert_eq!(first.remittance_unstructured, "Invoice 42");
        assert_eq!(first.remittance_reference, "");
        assert_eq!(first.status, PaymentStatus::Pending);

        let second = &file.payments()[1];
        assert_eq!(second.remittance_reference, "REF-99");
        assert_eq!(second.remittance_unstructured, "");
    }

    #[test]
    fn test_other_account_identifier_fallback() {
        let othr = "<Othr><Id>60161331926819</Id><SchmeNm><Prtry>SortCodeAccountNumber</Prtry></SchmeNm></Othr>";
        let xml = document("5.00", &[tx("I", "E", "5.00", othr, "")]);

        let decoded = decode(&xml).unwrap();
        let payment = &decoded.payments()[0];
        assert_eq!(payment.creditor_account_identifier, "60161331926819");
        assert_eq!(payment.creditor_account_scheme, "SortCodeAccountNumber");
    }

    #[test]
    fn test_empty_iban_falls_back_to_other() {
        let account = "<IBAN> </IBAN><Othr><Id>12345678</Id></Othr>";
        let xml = document("1.00", &[tx("I", "E", "1.00", account, "")]);

        let decoded = decode(&xml).unwrap();
        let payment = &decoded.payments()[0];
        assert_eq!(payment.creditor_account_identifier, "12345678");
        assert_eq!(payment.creditor_account_scheme, "OTHER");
    }

    #[test]
    fn test_missing_account_identifier_is_error() {
        let xml = document("1.00", &[tx("I", "E", "1.00", "", "")]);
        let err = decode(&xml).unwrap_err();
        assert!(
            matches!(&err, DecodeError::MissingField(p) if p.starts_with("PmtInf[0]/CdtTrfTxInf[0]/CdtrAcct/Id")),
            "{}",
            err
        );
    }

    #[test]
    fn test_missing_instr_id_uses_payment_information_id() {
        let xml = document("1.00", &[tx("", "E", "1.00", IBAN, "")]);
        assert_eq!(decode(&xml).unwrap().payments()[0].instruction_id, "PMTINF-1");
    }

    #[test]
    fn test_missing_end_to_end_id_is_error() {
        let xml = document("1.00", &[tx("I", "", "1.00", IBAN, "")]);
        assert!(matches!(
            decode(&xml).unwrap_err(),
            DecodeError::MissingField(p) if p.ends_with("PmtId/EndToEndId")
        ));
    }

    #[test]
    fn test_negative_amount_is_error() {
        let xml = document("-1.00", &[tx("I", "E", "-1.00", IBAN, "")]);
        assert!(matches!(decode(&xml).unwrap_err(), DecodeError::InvalidAmount { .. }));
    }

    #[test]
    fn test_embedded_control_sum_not_trusted() {
        let xml = document(
            "999999.99",
            &[tx("I1", "E1", "1.10", IBAN, ""), tx("I2", "E2", "2.20", IBAN, "")],
        );
        let file = decode(&xml).unwrap();
        assert_eq!(file.control_sum(), Decimal::from_str("3.30").unwrap());
    }

    #[test]
    fn test_truncated_document_is_error() {
        let xml = document("1.00", &[tx("I", "E", "1.00", IBAN, "")]);
        let truncated = &xml[..xml.len() / 2];
        assert!(decode(truncated).is_err());
    }

    #[test]
    fn test_not_xml_is_error() {
        assert!(matches!(
            decode(r#"{"Data":{}}"#).unwrap_err(),
            DecodeError::MissingField(p) if p == "Document"
        ));
    }

    #[test]
    fn test_wrong_root_element_is_error() {
        let xml = document("2.50", &[tx("P", "E", "2.50", IBAN, "")])
            .replace("<Document xmlns", "<Foo xmlns")
            .replace("</Document>", "</Foo>");
        assert!(matches!(
            decode(&xml).unwrap_err(),
            DecodeError::MissingField(p) if p == "Document"
        ));
    }
}
