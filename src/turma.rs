//! Class ("turma") name normalization.
//!
//! Historical rows spell the same class as "C", "TURMA C", "Turma C" or
//! "turma C". Lookups accept all four spellings; this is a compatibility shim
//! for those old writes, and new rows should be stored with the bare code
//! returned by [`normalize_turma_to_letter`].

const PREFIX: &str = "turma";
const MAX_CODE_LEN: usize = 3;

/// Reduces a class name to its bare upper-case code, or `None` when the input
/// is not a recognizable class name.
pub fn normalize_turma_to_letter(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let rest = match trimmed.get(..PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(PREFIX) => &trimmed[PREFIX.len()..],
        _ => trimmed,
    };
    let code = rest.trim();

    if code.is_empty()
        || code.len() > MAX_CODE_LEN
        || !code.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }

    Some(code.to_ascii_uppercase())
}

/// Every spelling under which rows of this class may have been stored. Falls
/// back to the raw string alone when it cannot be normalized.
pub fn class_spellings(raw: &str) -> Vec<String> {
    match normalize_turma_to_letter(raw) {
        Some(code) => vec![
            code.clone(),
            format!("TURMA {code}"),
            format!("Turma {code}"),
            format!("turma {code}"),
        ],
        None => vec![raw.to_string()],
    }
}

/// Canonical code used as a lookup key, or the raw string when unrecognized.
pub fn canonical_code(raw: &str) -> String {
    normalize_turma_to_letter(raw).unwrap_or_else(|| raw.to_string())
}
