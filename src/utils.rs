/// Calculates the 1-based line and column number for a byte position in the source text.
/// Only meant for error paths, as it walks the text up to `position`.
pub fn get_line_and_column(source: &str, position: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for (i, c) in source.char_indices() {
        if i >= position {
            break;
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_and_column() {
        let source = "enum A {\n  X \"x\"\n}";
        assert_eq!(get_line_and_column(source, 0), (1, 1));
        assert_eq!(get_line_and_column(source, 5), (1, 6));
        assert_eq!(get_line_and_column(source, 11), (2, 3));
        assert_eq!(get_line_and_column(source, source.len()), (3, 2));
    }

    #[test]
    fn test_multibyte_characters_count_as_one_column() {
        let source = "\"héllo\" X";
        // 'X' sits at byte 9 but is the 9th character
        assert_eq!(get_line_and_column(source, 9), (1, 9));
    }
}
