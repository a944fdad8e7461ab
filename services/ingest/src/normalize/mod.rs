//! Per-report normalizers: parsed tables in, typed records out.
//!
//! Shared contract: numeric fields never come out missing (absent or
//! unreadable values become 0 and are counted in [`CoercionStats`]), rows
//! without their identifying column are dropped, and synthetic `Total` rows
//! are filtered by name. Column lookups go through [`Row::first_present`]
//! with an ordered list of header spellings per field.
//!
//! [`CoercionStats`]: crate::coerce::CoercionStats
//! [`Row::first_present`]: crate::tabular::Row::first_present

pub mod instagram;
pub mod tiktok;
pub mod youtube;

/// Synthetic aggregate row emitted by some exports.
pub(crate) fn is_total_row(name: &str) -> bool {
    name.trim().eq_ignore_ascii_case("total")
}
