use crate::{HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of one buffer element, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum ElemWidth {
    Byte,
    Half,
    Word,
}

impl ElemWidth {
    /// Enumeration order used by the driver.
    pub const ALL: [ElemWidth; 3] = [ElemWidth::Byte, ElemWidth::Half, ElemWidth::Word];

    pub fn bytes(self) -> usize {
        match self {
            ElemWidth::Byte => 1,
            ElemWidth::Half => 2,
            ElemWidth::Word => 4,
        }
    }

    pub fn bits(self) -> u32 {
        self.bytes() as u32 * 8
    }

    pub fn mask(self) -> u32 {
        match self {
            ElemWidth::Byte => 0xFF,
            ElemWidth::Half => 0xFFFF,
            ElemWidth::Word => 0xFFFF_FFFF,
        }
    }
}

impl From<ElemWidth> for u32 {
    fn from(w: ElemWidth) -> u32 {
        w.bytes() as u32
    }
}

impl TryFrom<u32> for ElemWidth {
    type Error = HarnessError;

    fn try_from(value: u32) -> HarnessResult<Self> {
        match value {
            1 => Ok(ElemWidth::Byte),
            2 => Ok(ElemWidth::Half),
            4 => Ok(ElemWidth::Word),
            other => Err(HarnessError::InvalidWidth(other)),
        }
    }
}

impl fmt::Display for ElemWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bytes())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignMode {
    Unsigned,
    Signed,
}

impl SignMode {
    pub const ALL: [SignMode; 2] = [SignMode::Unsigned, SignMode::Signed];

    /// Value of the `sign` argument handed to the routine.
    pub fn flag(self) -> i32 {
        match self {
            SignMode::Unsigned => 0,
            SignMode::Signed => 1,
        }
    }
}

/// Keeps the low `width` bytes of `value`.
pub fn truncate(value: i64, width: ElemWidth) -> u32 {
    (value as u32) & width.mask()
}

/// Reads a truncated bit pattern as a number under `sign`.
pub fn reinterpret(raw: u32, width: ElemWidth, sign: SignMode) -> i64 {
    let raw = raw & width.mask();
    match sign {
        SignMode::Unsigned => raw as i64,
        SignMode::Signed => {
            let shift = 32 - width.bits();
            (((raw << shift) as i32) >> shift) as i64
        }
    }
}

/// Truncate then reinterpret.
pub fn normalize(value: i64, width: ElemWidth, sign: SignMode) -> i64 {
    reinterpret(truncate(value, width), width, sign)
}
