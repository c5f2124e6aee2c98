/// Appends one segment to an absolute node path. The root path `"/"` is the
/// only path ending in a slash, so the join must not double it.
pub fn append_path_segment(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Converts a 1-based line/column pair into a byte offset into `source`.
/// Only called when an error is being reported, so the linear scan over the
/// source text does not matter.
pub fn offset_for_position(source: &str, line: usize, column: usize) -> usize {
    let mut remaining_lines = line.saturating_sub(1);
    let mut line_start = 0;
    for (i, c) in source.char_indices() {
        if remaining_lines == 0 {
            line_start = i;
            break;
        }
        if c == '\n' {
            remaining_lines -= 1;
        }
        line_start = i + c.len_utf8();
    }
    (line_start + column.saturating_sub(1)).min(source.len())
}
