//! Branch Kinds.
//!
//! The host reports every resolved branch with its kind. The kind feeds two
//! places:
//! 1. **Feature History:** A 3-bit code per branch is shifted into the
//!    branch-type history feature.
//! 2. **Shadow Cache:** Returns touch the return target block in the shadow
//!    view, mirroring the host's out-of-order callback delivery.

use serde::{Deserialize, Serialize};

/// Kind of a resolved branch.
///
/// The discriminants are the 3-bit codes folded into the branch-type history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum BranchKind {
    /// Not a branch (also used for unknown codes).
    #[default]
    NotBranch = 0,
    /// Unconditional direct jump.
    DirectJump = 1,
    /// Indirect jump through a register.
    Indirect = 2,
    /// Conditional branch.
    Conditional = 3,
    /// Direct call.
    DirectCall = 4,
    /// Indirect call.
    IndirectCall = 5,
    /// Function return.
    Return = 6,
    /// Any other control transfer.
    Other = 7,
}

impl BranchKind {
    /// Returns the 3-bit code used by the branch-type history.
    #[inline(always)]
    pub const fn code(self) -> u64 {
        self as u64
    }

    /// Decodes a 3-bit code; values above 7 map to [`BranchKind::Other`].
    pub const fn from_code(code: u64) -> Self {
        match code {
            0 => Self::NotBranch,
            1 => Self::DirectJump,
            2 => Self::Indirect,
            3 => Self::Conditional,
            4 => Self::DirectCall,
            5 => Self::IndirectCall,
            6 => Self::Return,
            _ => Self::Other,
        }
    }

    /// Parses the mnemonic used in trace files (`cond`, `call`, `return`, ...).
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        let kind = match name {
            "none" => Self::NotBranch,
            "jump" | "direct" => Self::DirectJump,
            "indirect" => Self::Indirect,
            "cond" | "conditional" => Self::Conditional,
            "call" => Self::DirectCall,
            "icall" => Self::IndirectCall,
            "ret" | "return" => Self::Return,
            "other" => Self::Other,
            _ => return None,
        };
        Some(kind)
    }
}
