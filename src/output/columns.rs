use console::{measure_text_width, pad_str, Alignment};

/// Width of each column: the widest of its header and all of its cells.
///
/// Widths are terminal display columns, so wide characters count double and
/// ANSI styling counts for nothing. With no rows the headers alone decide.
pub fn fit_columns<R, S>(headers: &[&str], rows: &[R]) -> Vec<usize>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            rows.iter()
                .filter_map(|row| row.as_ref().get(col))
                .map(|cell| measure_text_width(cell.as_ref()))
                .fold(measure_text_width(header), usize::max)
        })
        .collect()
}

/// Left-aligns every cell to its column width and joins them with one space.
pub fn format_line<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| pad_str(cell.as_ref(), *width, Alignment::Left, None).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
