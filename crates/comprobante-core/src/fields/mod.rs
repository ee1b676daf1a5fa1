//! Field resolution over OCR output.

pub mod documento;
pub mod patterns;
pub mod valor;

pub use documento::{fallback_id, find_documento};
pub use valor::{find_valor, normalize};
