/// Shell completion line splitting.
///
/// Shells hand completion requests over as one raw line (`COMP_LINE`). The
/// last token is the one being completed, so a trailing unquoted space means
/// "complete a fresh, empty token".

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Split a completion line into tokens.
///
/// - Unquoted whitespace separates tokens.
/// - `'...'` is literal; `"..."` honors `\"` and `\\`.
/// - A backslash outside quotes escapes the next character.
/// - An unterminated quote runs to the end of the line (the user is still
///   typing it).
/// - Trailing unquoted whitespace yields a final empty token.
#[must_use]
pub fn split_comp_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote = Quote::None;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Quote::None, c) if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            (Quote::None, '\'') => {
                quote = Quote::Single;
                in_token = true;
            }
            (Quote::None, '"') => {
                quote = Quote::Double;
                in_token = true;
            }
            (Quote::None, '\\') => {
                in_token = true;
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            (Quote::Single, '\'') | (Quote::Double, '"') => quote = Quote::None,
            (Quote::Double, '\\') => match chars.peek() {
                Some(&next) if next == '"' || next == '\\' => {
                    current.push(next);
                    chars.next();
                }
                _ => current.push('\\'),
            },
            (_, c) => {
                in_token = true;
                current.push(c);
            }
        }
    }

    if in_token {
        tokens.push(current);
    } else if line.ends_with(char::is_whitespace) {
        tokens.push(String::new());
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_split() {
        assert_eq!(split_comp_line("cmd a bc"), ["cmd", "a", "bc"]);
    }

    #[test]
    fn test_trailing_space_adds_empty_token() {
        assert_eq!(split_comp_line("cmd a "), ["cmd", "a", ""]);
    }

    #[test]
    fn test_quotes() {
        assert_eq!(
            split_comp_line(r#"cmd 'a b' "c \"d\"" e\ f"#),
            ["cmd", "a b", "c \"d\"", "e f"]
        );
    }

    #[test]
    fn test_unterminated_quote_is_partial() {
        assert_eq!(split_comp_line("cmd \"hello wo"), ["cmd", "hello wo"]);
    }

    #[test]
    fn test_empty_quotes_make_token() {
        assert_eq!(split_comp_line("cmd ''"), ["cmd", ""]);
    }

    #[test]
    fn test_empty_line() {
        assert!(split_comp_line("").is_empty());
    }
}
