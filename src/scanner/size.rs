const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

const GIGABYTE: f64 = 1024.0 * 1024.0 * 1024.0;

/// Convert a byte count into a display label and a gigabyte value.
///
/// The label uses the largest 1024-based unit that keeps the scaled value at or
/// above one, rounded to two decimals. The second value is always expressed in
/// GB (also rounded to two decimals) whatever unit the label picked, so callers
/// can sort rows and fill progress totals on a single scale.
pub fn humanize(bytes: u64) -> (String, f64) {
    if bytes == 0 {
        return ("0B".to_string(), 0.0);
    }

    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    // Debug formatting keeps the shortest representation with a trailing ".0"
    let label = format!("{:?} {}", round2(size), UNITS[unit_idx]);

    (label, gigabytes(bytes))
}

/// Size in gigabytes rounded to two decimals.
pub fn gigabytes(bytes: u64) -> f64 {
    round2(bytes as f64 / GIGABYTE)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
