use super::normalize::NormalizedRow;

/// Orders rows by build machine, then by queue time, oldest first.
///
/// Stable: rows with the same machine and queue time keep their input order.
pub fn sort_rows(mut rows: Vec<NormalizedRow>) -> Vec<NormalizedRow> {
    rows.sort_by(|a, b| {
        a.machine
            .cmp(&b.machine)
            .then_with(|| a.queued_at.cmp(&b.queued_at))
    });
    rows
}
