/// Quantities below this are always printed as plain integers.
const PLAIN_LIMIT: u64 = 1024;

const SI_UNITS: [&str; 6] = ["k", "M", "G", "T", "P", "E"];
const IEC_UNITS: [&str; 6] = ["Ki", "Mi", "Gi", "Ti", "Pi", "Ei"];

/// Formats `n` with SI (powers of 1000) unit prefixes: `k`, `M`, `G`, `T`, `P`, `E`.
///
/// Values below 1024 are printed as is. Larger ones keep one decimal while the
/// scaled value is below 10 (`"1.0k"`, `"9.9M"`) and none above (`"999k"`). Digits
/// are truncated, never rounded, so the result is at most 5 characters long.
pub fn format_si(n: u64) -> String {
    format_quantity(n, 1000, &SI_UNITS)
}

/// Formats `n` with IEC (powers of 1024) unit prefixes: `Ki`, `Mi`, `Gi`, `Ti`, `Pi`, `Ei`.
///
/// Same layout as [`format_si`]. The result is at most 6 characters long (`"1023Ki"`).
pub fn format_iec(n: u64) -> String {
    format_quantity(n, 1024, &IEC_UNITS)
}

fn format_quantity(n: u64, base: u64, units: &[&str; 6]) -> String {
    if n < PLAIN_LIMIT {
        return n.to_string();
    }

    let mut scale = 1;
    let mut unit = 0;
    while unit < units.len() && n / scale >= base {
        scale *= base;
        unit += 1;
    }

    let whole = n / scale;
    let suffix = units[unit - 1];
    if whole < 10 {
        // scale <= 1024^6, so the product stays below 2^64
        let tenth = (n % scale) * 10 / scale;
        format!("{whole}.{tenth}{suffix}")
    } else {
        format!("{whole}{suffix}")
    }
}
