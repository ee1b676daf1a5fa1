//! Recognition configurations tried in priority order.

/// A single recognition attempt configuration.
///
/// Backends honor what they can: Tesseract maps `page_seg_mode` onto its
/// PSM setting, a stub backend may ignore everything but still return
/// deterministic text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionConfig {
    /// Short name used in logs.
    pub name: &'static str,
    /// Page segmentation mode (Tesseract PSM numbering).
    pub page_seg_mode: u32,
    /// Restrict recognition to these characters, if set.
    pub char_whitelist: Option<&'static str>,
}

impl RecognitionConfig {
    pub const fn new(name: &'static str, page_seg_mode: u32) -> Self {
        Self {
            name,
            page_seg_mode,
            char_whitelist: None,
        }
    }

    pub const fn with_whitelist(mut self, whitelist: &'static str) -> Self {
        self.char_whitelist = Some(whitelist);
        self
    }
}

/// Characters that appear in the monetary fields of the targeted layouts:
/// digits, separators, the currency sign and the NETO label.
pub const FINANCIAL_WHITELIST: &str = "0123456789,.$ NETO";

/// Cascade for document-number zones: uniform block, single line, single
/// word, raw line.
pub fn documento_configs() -> Vec<RecognitionConfig> {
    vec![
        RecognitionConfig::new("block", 6),
        RecognitionConfig::new("line", 7),
        RecognitionConfig::new("word", 8),
        RecognitionConfig::new("raw-line", 13),
    ]
}

/// Cascade for monetary zones: a whitelisted block pass first, then the
/// layout variants from densest to loosest.
pub fn valor_configs() -> Vec<RecognitionConfig> {
    vec![
        RecognitionConfig::new("financial-block", 6).with_whitelist(FINANCIAL_WHITELIST),
        RecognitionConfig::new("block", 6),
        RecognitionConfig::new("column", 4),
        RecognitionConfig::new("line", 7),
        RecognitionConfig::new("word", 8),
        RecognitionConfig::new("sparse", 11),
        RecognitionConfig::new("raw-line", 13),
    ]
}
