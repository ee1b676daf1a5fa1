//! Regex cascades for field resolution.
//!
//! Order matters: patterns are tried top to bottom and the first match
//! that clears the acceptance rule wins. Reordering changes observable
//! output.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Document-number cascade: exact label, OCR-degraded label variants,
    /// then bare digit runs from longest to shortest.
    pub static ref DOCUMENTO_CASCADE: Vec<Regex> = vec![
        Regex::new(r"(?i)Documento[:\s]*(\d{8,15})").unwrap(),
        Regex::new(r"(?i)ocumento[:\s]*(\d{8,15})").unwrap(),
        Regex::new(r"(?i)umento[:\s]*(\d{8,15})").unwrap(),
        Regex::new(r"(?i)Doc[a-z]*[:\s]*(\d{8,15})").unwrap(),
        Regex::new(r"(\d{10,15})").unwrap(),
        Regex::new(r"(\d{8,9})").unwrap(),
    ];

    /// Monetary-value cascade: labeled totals first, then progressively
    /// looser grouped-digit shapes.
    pub static ref VALOR_CASCADE: Vec<Regex> = vec![
        // NETO with OCR-spaced digit groups: NETO $ 16, 220, 167 . 00
        Regex::new(r"(?i)NETO[\s]*\$?[\s]*([0-9]{1,3}[\s,\.]*[0-9]{3}[\s,\.]*[0-9]{3}[\s\.]*[0-9]{2})")
            .unwrap(),
        // Any large digit group with OCR spacing
        Regex::new(r"([0-9]{1,3}[\s,]*[0-9]{3}[\s,]*[0-9]{3}[\s\.]*[0-9]{2})").unwrap(),
        // NETO with conventional grouping
        Regex::new(r"(?i)NETO[\s]*\$?[\s]*([0-9]{1,3}(?:[,\.][0-9]{3})*[,\.][0-9]{2})").unwrap(),
        // Labeled totals with a colon
        Regex::new(
            r"(?i)(?:SUBTOTAL|IVA|TOTAL|NETO)[\s]*:[\s]*\$?[\s]*([0-9]{1,3}(?:[,\.][0-9]{3})*[,\.][0-9]{2})",
        )
        .unwrap(),
        // NET0 and friends, for degraded label reads
        Regex::new(r"(?i)NET[O0]?[\s]*\$?[\s]*([0-9]{1,3}(?:[,\.][0-9]{3})*[,\.][0-9]{2})").unwrap(),
        // Millions-range grouped values
        Regex::new(r"([0-9]{2,3}[,\.][0-9]{3}[,\.][0-9]{3}[,\.][0-9]{2})").unwrap(),
        // NETO followed by an ungrouped value
        Regex::new(r"(?i)NETO[\s]+([0-9]{6,}[,\.][0-9]{2})").unwrap(),
        // Value anywhere after a NETO-ish token
        Regex::new(r"(?i)NET[O0]?.*?([0-9]{1,3}(?:[,\.][0-9]{3})*[,\.][0-9]{2})").unwrap(),
    ];
}
