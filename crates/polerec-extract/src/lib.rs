//! Schema extraction and write-back: SPIDAcalc exchange, Katapult Pro job,
//! and structure-preserving patches to the SPIDA document.

mod error;
pub use error::{ExtractError, PatchError};

pub mod attrs;

mod katapult;
pub use katapult::KatapultExtractor;

mod spida;
pub use spida::{
    length_to_height, SpidaExtractor, MEASURED_DESIGN, MEASURED_LAYER, RECOMMENDED_DESIGN,
    RECOMMENDED_LAYER,
};

mod patch;
pub use patch::{
    apply_batch, apply_edit, set_com_drop, set_loading, set_pole_spec, Edit, PatchOutcome,
};
