//! Closed set of symbol kinds
//!
//! Every binding in the symbol table carries exactly one [`SymbolKind`].
//! Classification questions (is it a gate, can it be redeclared, what is
//! its element kind) are answered here with exhaustive matches so that a
//! new kind cannot be added without deciding each of them.

use std::fmt;

use super::width::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolKind {
    /// Referenced but never resolved to a concrete kind
    Undefined,

    // Classical scalars
    Void,
    Bool,
    Char,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
    LongDouble,
    MpInteger,
    MpUInteger,
    MpDecimal,
    MpComplex,
    /// Classical bit register (`bit[N]`, `creg`)
    Bitset,

    Angle,

    // Quantum
    Qubit,
    QubitContainer,
    QubitContainerAlias,
    GateQubitParam,
    Gate,
    UGate,
    CxGate,
    CcxGate,
    CNotGate,
    HadamardGate,
    Defcal,
    DefcalMeasure,
    DefcalReset,
    DefcalGroup,

    // Callables
    Function,
    Kernel,
    Extern,

    // Timing
    Duration,
    Delay,
    Stretch,
    Length,
    TimeUnit,

    // Pulse
    Frame,
    Port,
    Waveform,

    Pragma,
    /// The `array` keyword before its element type is known
    Array,
    BinaryOp,
    UnaryOp,

    // Arrays
    AngleArray,
    BoolArray,
    BitArray,
    IntArray,
    UIntArray,
    FloatArray,
    MpIntegerArray,
    MpUIntegerArray,
    MpDecimalArray,
    MpComplexArray,
    DurationArray,
    QubitArray,
    FrameArray,
    PortArray,
    WaveformArray,
    LengthArray,
}

impl SymbolKind {
    pub fn name(self) -> &'static str {
        match self {
            SymbolKind::Undefined => "undefined",
            SymbolKind::Void => "void",
            SymbolKind::Bool => "bool",
            SymbolKind::Char => "char",
            SymbolKind::Int => "int",
            SymbolKind::UInt => "uint",
            SymbolKind::Long => "long",
            SymbolKind::ULong => "ulong",
            SymbolKind::Float => "float",
            SymbolKind::Double => "double",
            SymbolKind::LongDouble => "long double",
            SymbolKind::MpInteger => "mp-integer",
            SymbolKind::MpUInteger => "mp-unsigned",
            SymbolKind::MpDecimal => "mp-decimal",
            SymbolKind::MpComplex => "mp-complex",
            SymbolKind::Bitset => "bit",
            SymbolKind::Angle => "angle",
            SymbolKind::Qubit => "qubit",
            SymbolKind::QubitContainer => "qubit register",
            SymbolKind::QubitContainerAlias => "qubit alias",
            SymbolKind::GateQubitParam => "gate qubit parameter",
            SymbolKind::Gate => "gate",
            SymbolKind::UGate => "U gate",
            SymbolKind::CxGate => "cx gate",
            SymbolKind::CcxGate => "ccx gate",
            SymbolKind::CNotGate => "cnot gate",
            SymbolKind::HadamardGate => "hadamard gate",
            SymbolKind::Defcal => "defcal",
            SymbolKind::DefcalMeasure => "defcal measure",
            SymbolKind::DefcalReset => "defcal reset",
            SymbolKind::DefcalGroup => "defcal group",
            SymbolKind::Function => "function",
            SymbolKind::Kernel => "kernel",
            SymbolKind::Extern => "extern",
            SymbolKind::Duration => "duration",
            SymbolKind::Delay => "delay",
            SymbolKind::Stretch => "stretch",
            SymbolKind::Length => "length",
            SymbolKind::TimeUnit => "time unit",
            SymbolKind::Frame => "frame",
            SymbolKind::Port => "port",
            SymbolKind::Waveform => "waveform",
            SymbolKind::Pragma => "pragma",
            SymbolKind::Array => "array",
            SymbolKind::BinaryOp => "binary operation",
            SymbolKind::UnaryOp => "unary operation",
            SymbolKind::AngleArray => "angle array",
            SymbolKind::BoolArray => "bool array",
            SymbolKind::BitArray => "bit array",
            SymbolKind::IntArray => "int array",
            SymbolKind::UIntArray => "uint array",
            SymbolKind::FloatArray => "float array",
            SymbolKind::MpIntegerArray => "mp-integer array",
            SymbolKind::MpUIntegerArray => "mp-unsigned array",
            SymbolKind::MpDecimalArray => "mp-decimal array",
            SymbolKind::MpComplexArray => "mp-complex array",
            SymbolKind::DurationArray => "duration array",
            SymbolKind::QubitArray => "qubit array",
            SymbolKind::FrameArray => "frame array",
            SymbolKind::PortArray => "port array",
            SymbolKind::WaveformArray => "waveform array",
            SymbolKind::LengthArray => "length array",
        }
    }

    /// Width used when a declaration does not state one
    pub fn default_bits(self) -> u32 {
        match self {
            SymbolKind::Undefined | SymbolKind::Void | SymbolKind::Array => UNKNOWN_BITS,
            SymbolKind::Bool => BOOL_BITS,
            SymbolKind::Char => CHAR_BITS,
            SymbolKind::Int | SymbolKind::UInt => INT_BITS,
            SymbolKind::Long | SymbolKind::ULong => LONG_BITS,
            SymbolKind::Float => FLOAT_BITS,
            SymbolKind::Double => DOUBLE_BITS,
            SymbolKind::LongDouble => LONG_DOUBLE_BITS,
            SymbolKind::MpInteger
            | SymbolKind::MpUInteger
            | SymbolKind::MpDecimal
            | SymbolKind::MpComplex => MP_DEFAULT_BITS,
            SymbolKind::Bitset
            | SymbolKind::Qubit
            | SymbolKind::QubitContainer
            | SymbolKind::QubitContainerAlias
            | SymbolKind::GateQubitParam => QUBIT_BITS,
            SymbolKind::Angle => ANGLE_BITS,
            SymbolKind::Gate
            | SymbolKind::UGate
            | SymbolKind::CxGate
            | SymbolKind::CcxGate
            | SymbolKind::CNotGate
            | SymbolKind::HadamardGate => GATE_BITS,
            SymbolKind::Defcal
            | SymbolKind::DefcalMeasure
            | SymbolKind::DefcalReset
            | SymbolKind::DefcalGroup => DEFCAL_BITS,
            SymbolKind::Function | SymbolKind::Extern => FUNCTION_BITS,
            SymbolKind::Kernel => KERNEL_BITS,
            SymbolKind::Duration | SymbolKind::Stretch | SymbolKind::TimeUnit => DURATION_BITS,
            SymbolKind::Delay => DELAY_BITS,
            SymbolKind::Length => LENGTH_BITS,
            SymbolKind::Frame => FRAME_BITS,
            SymbolKind::Port => PORT_BITS,
            SymbolKind::Waveform => WAVEFORM_BITS,
            SymbolKind::Pragma => PRAGMA_BITS,
            SymbolKind::BinaryOp | SymbolKind::UnaryOp => LONG_BITS,
            SymbolKind::AngleArray
            | SymbolKind::BoolArray
            | SymbolKind::BitArray
            | SymbolKind::IntArray
            | SymbolKind::UIntArray
            | SymbolKind::FloatArray
            | SymbolKind::MpIntegerArray
            | SymbolKind::MpUIntegerArray
            | SymbolKind::MpDecimalArray
            | SymbolKind::MpComplexArray
            | SymbolKind::DurationArray
            | SymbolKind::QubitArray
            | SymbolKind::FrameArray
            | SymbolKind::PortArray
            | SymbolKind::WaveformArray
            | SymbolKind::LengthArray => ARRAY_BITS,
        }
    }

    // ==================== Classification ====================

    pub fn is_gate(self) -> bool {
        matches!(
            self,
            SymbolKind::Gate
                | SymbolKind::UGate
                | SymbolKind::CxGate
                | SymbolKind::CcxGate
                | SymbolKind::CNotGate
                | SymbolKind::HadamardGate
        )
    }

    pub fn is_qubit(self) -> bool {
        matches!(
            self,
            SymbolKind::Qubit | SymbolKind::QubitContainer | SymbolKind::QubitContainerAlias
        )
    }

    /// Qubit kinds plus gate qubit parameters
    pub fn is_qubit_param(self) -> bool {
        self.is_qubit() || self == SymbolKind::GateQubitParam
    }

    pub fn is_defcal(self) -> bool {
        matches!(
            self,
            SymbolKind::Defcal | SymbolKind::DefcalMeasure | SymbolKind::DefcalReset
        )
    }

    pub fn is_callable(self) -> bool {
        matches!(
            self,
            SymbolKind::Function | SymbolKind::Kernel | SymbolKind::Extern
        )
    }

    pub fn is_pulse(self) -> bool {
        matches!(self, SymbolKind::Frame | SymbolKind::Port | SymbolKind::Waveform)
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            SymbolKind::Int
                | SymbolKind::UInt
                | SymbolKind::Long
                | SymbolKind::ULong
                | SymbolKind::MpInteger
                | SymbolKind::MpUInteger
        )
    }

    /// Plain machine integers, as opposed to multi-precision ones
    pub fn is_simple_integer(self) -> bool {
        matches!(self, SymbolKind::Int | SymbolKind::UInt)
    }

    /// Kinds accepted as the value of an identifier used as an index
    pub fn is_index_kind(self) -> bool {
        self.is_integer()
            || matches!(
                self,
                SymbolKind::BinaryOp | SymbolKind::UnaryOp | SymbolKind::Undefined
            )
    }

    pub fn is_array(self) -> bool {
        self.element_kind().is_some()
    }

    /// Kinds that are visible from every context once declared
    pub fn is_always_visible(self) -> bool {
        self.is_gate() || self.is_qubit_param() || self.is_callable()
    }

    /// Several bindings of these kinds may share a name in one context
    pub fn is_overloadable(self) -> bool {
        self.is_defcal()
    }

    /// Kinds a nested block may shadow with a fresh declaration
    pub fn allows_redeclaration(self) -> bool {
        matches!(
            self,
            SymbolKind::Bool
                | SymbolKind::Bitset
                | SymbolKind::Int
                | SymbolKind::UInt
                | SymbolKind::Float
                | SymbolKind::Double
                | SymbolKind::LongDouble
                | SymbolKind::MpInteger
                | SymbolKind::MpUInteger
                | SymbolKind::MpDecimal
                | SymbolKind::MpComplex
                | SymbolKind::Angle
        )
    }

    pub fn can_have_local_scope(self) -> bool {
        !(self.is_gate()
            || self.is_defcal()
            || self.is_callable()
            || self == SymbolKind::DefcalGroup)
    }

    // ==================== Arrays ====================

    /// Element kind of an array kind, `None` for non-arrays
    pub fn element_kind(self) -> Option<SymbolKind> {
        let element = match self {
            SymbolKind::AngleArray => SymbolKind::Angle,
            SymbolKind::BoolArray => SymbolKind::Bool,
            SymbolKind::BitArray => SymbolKind::Bitset,
            SymbolKind::IntArray => SymbolKind::Int,
            SymbolKind::UIntArray => SymbolKind::UInt,
            SymbolKind::FloatArray => SymbolKind::Float,
            SymbolKind::MpIntegerArray => SymbolKind::MpInteger,
            SymbolKind::MpUIntegerArray => SymbolKind::MpUInteger,
            SymbolKind::MpDecimalArray => SymbolKind::MpDecimal,
            SymbolKind::MpComplexArray => SymbolKind::MpComplex,
            SymbolKind::DurationArray => SymbolKind::Duration,
            SymbolKind::QubitArray => SymbolKind::QubitContainer,
            SymbolKind::FrameArray => SymbolKind::Frame,
            SymbolKind::PortArray => SymbolKind::Port,
            SymbolKind::WaveformArray => SymbolKind::Waveform,
            SymbolKind::LengthArray => SymbolKind::Length,
            _ => return None,
        };
        Some(element)
    }

    /// The array-of-T kind for an element kind T
    pub fn array_of(self) -> Option<SymbolKind> {
        let array = match self {
            SymbolKind::Angle => SymbolKind::AngleArray,
            SymbolKind::Bool => SymbolKind::BoolArray,
            SymbolKind::Bitset => SymbolKind::BitArray,
            SymbolKind::Int => SymbolKind::IntArray,
            SymbolKind::UInt => SymbolKind::UIntArray,
            SymbolKind::Float | SymbolKind::Double => SymbolKind::FloatArray,
            SymbolKind::MpInteger => SymbolKind::MpIntegerArray,
            SymbolKind::MpUInteger => SymbolKind::MpUIntegerArray,
            SymbolKind::MpDecimal => SymbolKind::MpDecimalArray,
            SymbolKind::MpComplex => SymbolKind::MpComplexArray,
            SymbolKind::Duration => SymbolKind::DurationArray,
            SymbolKind::Qubit | SymbolKind::QubitContainer => SymbolKind::QubitArray,
            SymbolKind::Frame => SymbolKind::FrameArray,
            SymbolKind::Port => SymbolKind::PortArray,
            SymbolKind::Waveform => SymbolKind::WaveformArray,
            SymbolKind::Length => SymbolKind::LengthArray,
            _ => return None,
        };
        Some(array)
    }

    /// Whether an existing binding of kind `self` may be re-typed in place
    /// as `target`.
    ///
    /// Covers placeholder upgrades and precision changes within one numeric
    /// family. Identical kinds are trivially compatible.
    pub fn normalizes_to(self, target: SymbolKind) -> bool {
        if self == target || self == SymbolKind::Undefined {
            return true;
        }
        matches!(
            (self, target),
            (SymbolKind::Int, SymbolKind::MpInteger)
                | (SymbolKind::MpInteger, SymbolKind::Int)
                | (SymbolKind::UInt, SymbolKind::MpUInteger)
                | (SymbolKind::MpUInteger, SymbolKind::UInt)
                | (SymbolKind::Float | SymbolKind::Double, SymbolKind::MpDecimal)
                | (SymbolKind::MpDecimal, SymbolKind::Float | SymbolKind::Double)
                | (SymbolKind::Float, SymbolKind::Double)
                | (SymbolKind::Double, SymbolKind::Float)
        )
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_classification() {
        assert!(SymbolKind::UGate.is_gate());
        assert!(SymbolKind::HadamardGate.is_always_visible());
        assert!(!SymbolKind::Defcal.is_gate());
        assert!(!SymbolKind::Gate.can_have_local_scope());
        assert!(!SymbolKind::DefcalGroup.can_have_local_scope());
        assert!(SymbolKind::Int.can_have_local_scope());
    }

    #[test]
    fn test_redeclaration_allow_list() {
        assert!(SymbolKind::Int.allows_redeclaration());
        assert!(SymbolKind::Angle.allows_redeclaration());
        assert!(SymbolKind::MpComplex.allows_redeclaration());
        assert!(!SymbolKind::QubitContainer.allows_redeclaration());
        assert!(!SymbolKind::Gate.allows_redeclaration());
        assert!(!SymbolKind::Undefined.allows_redeclaration());
    }

    #[test]
    fn test_array_kinds() {
        assert_eq!(SymbolKind::Int.array_of(), Some(SymbolKind::IntArray));
        assert_eq!(SymbolKind::Double.array_of(), Some(SymbolKind::FloatArray));
        assert_eq!(SymbolKind::QubitArray.element_kind(), Some(SymbolKind::QubitContainer));
        assert_eq!(SymbolKind::Gate.array_of(), None);
        assert!(SymbolKind::WaveformArray.is_array());
        assert!(!SymbolKind::Waveform.is_array());
    }

    #[test]
    fn test_normalization_rules() {
        assert!(SymbolKind::Undefined.normalizes_to(SymbolKind::Gate));
        assert!(SymbolKind::Int.normalizes_to(SymbolKind::MpInteger));
        assert!(SymbolKind::Double.normalizes_to(SymbolKind::MpDecimal));
        assert!(!SymbolKind::Int.normalizes_to(SymbolKind::Angle));
        assert!(!SymbolKind::Gate.normalizes_to(SymbolKind::Undefined));
    }

    #[test]
    fn test_default_widths() {
        assert_eq!(SymbolKind::Int.default_bits(), INT_BITS);
        assert_eq!(SymbolKind::Angle.default_bits(), ANGLE_BITS);
        assert_eq!(SymbolKind::QubitContainer.default_bits(), 1);
        assert_eq!(SymbolKind::Undefined.default_bits(), UNKNOWN_BITS);
        assert_eq!(SymbolKind::LongDouble.default_bits(), 128);
    }

    #[test]
    fn test_index_kinds() {
        assert!(SymbolKind::MpUInteger.is_index_kind());
        assert!(SymbolKind::BinaryOp.is_index_kind());
        assert!(SymbolKind::Undefined.is_index_kind());
        assert!(!SymbolKind::Float.is_index_kind());
    }
}
