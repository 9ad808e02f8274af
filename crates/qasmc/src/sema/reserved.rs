//! Reserved and builtin names of the language

use crate::types::SymbolKind;

/// Mathematical constants usable anywhere without declaration
pub const RESERVED_CONSTANTS: [&str; 6] = ["pi", "tau", "euler", "π", "τ", "ε"];

/// Names that denote an angle when no declaration precedes them
pub const IMPLICIT_ANGLES: [&str; 72] = [
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa",
    "lambda", "mu", "nu", "xi", "omicron", "pi", "rho", "sigma", "tau", "upsilon", "phi", "chi",
    "psi", "omega", "α", "β", "γ", "δ", "ε", "ζ", "η", "θ", "ι", "κ", "λ", "μ", "ν", "ξ", "ο",
    "π", "ρ", "σ", "τ", "υ", "φ", "χ", "ψ", "ω", "Α", "Β", "Γ", "Δ", "Ε", "Ζ", "Η", "Θ", "Ι",
    "Κ", "Λ", "Μ", "Ν", "Ξ", "Ο", "Π", "Ρ", "Σ", "Τ", "Υ", "Φ", "Χ", "Ψ", "Ω",
];

pub const BUILTIN_GATES: [&str; 1] = ["U"];

pub const BUILTIN_FUNCTIONS: [&str; 4] = ["mix", "sum", "phase_shift", "scale"];

/// Frame manipulation functions, only meaningful inside `cal`/`defcal`
pub const PULSE_FUNCTIONS: [&str; 6] = [
    "set_phase",
    "get_phase",
    "shift_phase",
    "set_frequency",
    "get_frequency",
    "shift_frequency",
];

pub fn is_reserved_constant(name: &str) -> bool {
    RESERVED_CONSTANTS.contains(&name)
}

/// `-pi`, `-τ` and friends
pub fn negated_constant(name: &str) -> Option<&str> {
    name.strip_prefix('-').filter(|rest| is_reserved_constant(rest))
}

pub fn is_implicit_angle(name: &str) -> bool {
    IMPLICIT_ANGLES.contains(&name)
}

pub fn is_builtin_gate(name: &str) -> bool {
    BUILTIN_GATES.contains(&name)
}

pub fn is_builtin_function(name: &str) -> bool {
    BUILTIN_FUNCTIONS.contains(&name)
}

pub fn is_pulse_function(name: &str) -> bool {
    PULSE_FUNCTIONS.contains(&name)
}

/// Kind of an OpenQASM 2 reserved gate name (case-insensitive)
pub fn openqasm2_gate(name: &str) -> Option<SymbolKind> {
    match name.to_lowercase().as_str() {
        "h" | "hadamard" => Some(SymbolKind::HadamardGate),
        "cx" => Some(SymbolKind::CxGate),
        "ccx" => Some(SymbolKind::CcxGate),
        "cnot" => Some(SymbolKind::CNotGate),
        "u" => Some(SymbolKind::UGate),
        _ => None,
    }
}

/// Numeric value of a reserved constant
pub fn constant_value(name: &str) -> Option<f64> {
    match name {
        "pi" | "π" => Some(std::f64::consts::PI),
        "tau" | "τ" => Some(std::f64::consts::TAU),
        "euler" | "ε" => Some(std::f64::consts::E),
        _ => None,
    }
}

/// Member suffixes a kind accepts (`c.creal`, `f.phase`)
pub fn reserved_suffixes(kind: SymbolKind) -> &'static [&'static str] {
    match kind {
        SymbolKind::MpComplex => &["creal", "cimag"],
        SymbolKind::Frame => &["freq", "frequency", "phase", "time"],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_constants() {
        assert!(is_reserved_constant("pi"));
        assert!(is_reserved_constant("τ"));
        assert!(!is_reserved_constant("theta"));
        assert_eq!(negated_constant("-pi"), Some("pi"));
        assert_eq!(negated_constant("-theta"), None);
        assert_eq!(negated_constant("pi"), None);
    }

    #[test]
    fn test_implicit_angles_include_glyphs() {
        assert!(is_implicit_angle("theta"));
        assert!(is_implicit_angle("θ"));
        assert!(is_implicit_angle("Ω"));
        assert!(!is_implicit_angle("q"));
    }

    #[test]
    fn test_openqasm2_gates_ignore_case() {
        assert_eq!(openqasm2_gate("CX"), Some(SymbolKind::CxGate));
        assert_eq!(openqasm2_gate("Hadamard"), Some(SymbolKind::HadamardGate));
        assert_eq!(openqasm2_gate("rz"), None);
    }

    #[test]
    fn test_suffixes() {
        assert!(reserved_suffixes(SymbolKind::Frame).contains(&"phase"));
        assert!(reserved_suffixes(SymbolKind::Int).is_empty());
    }

    #[test]
    fn test_constant_values() {
        assert_eq!(constant_value("tau"), Some(std::f64::consts::TAU));
        assert_eq!(constant_value("ε"), Some(std::f64::consts::E));
        assert_eq!(constant_value("x"), None);
    }
}
