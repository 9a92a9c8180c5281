use serde::{Deserialize, Serialize};

/// The two currencies handled by the desk.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Currency {
    #[serde(rename = "MXN", alias = "mxn")]
    Mxn,
    #[default]
    #[serde(rename = "USDT", alias = "usdt")]
    Usdt,
}

serde_plain::derive_display_from_serialize!(Currency);
serde_plain::derive_fromstr_from_deserialize!(Currency);
