//! Default bit widths for each symbol kind
//!
//! A width of [`UNKNOWN_BITS`] or [`INVALID_BITS`] means "not known yet".

pub const UNKNOWN_BITS: u32 = 0;
pub const INVALID_BITS: u32 = u32::MAX;

// ==================== Classical scalars ====================

pub const BOOL_BITS: u32 = 8;
pub const CHAR_BITS: u32 = 8;
pub const INT_BITS: u32 = 32;
pub const LONG_BITS: u32 = 64;
pub const FLOAT_BITS: u32 = 32;
pub const DOUBLE_BITS: u32 = 64;
pub const LONG_DOUBLE_BITS: u32 = 128;
pub const MP_DEFAULT_BITS: u32 = 64;

// ==================== Quantum and pulse ====================

pub const ANGLE_BITS: u32 = 64;
pub const QUBIT_BITS: u32 = 1;
pub const GATE_BITS: u32 = 64;
pub const DEFCAL_BITS: u32 = 64;
pub const FUNCTION_BITS: u32 = 64;
pub const KERNEL_BITS: u32 = 64;
pub const DURATION_BITS: u32 = 64;
pub const DELAY_BITS: u32 = 64;
pub const LENGTH_BITS: u32 = 64;
pub const ARRAY_BITS: u32 = 64;
pub const FRAME_BITS: u32 = 64;
pub const PORT_BITS: u32 = 64;
pub const WAVEFORM_BITS: u32 = 64;
pub const PRAGMA_BITS: u32 = 64;

/// Number of addressable components an angle decomposes into
pub const ANGLE_COMPONENTS: u32 = 4;

/// True for the "not known yet" sentinels
pub fn is_unknown(bits: u32) -> bool {
    bits == UNKNOWN_BITS || bits == INVALID_BITS
}
