/// `[name="value"]` with the value quoted for a CSS attribute selector.
pub fn attribute_selector(name: &str, value: &str) -> String {
    format!("[{name}=\"{}\"]", escape_css_string(value))
}

/// `input[name="..."]`.
pub fn input_by_name(name: &str) -> String {
    format!("input{}", attribute_selector("name", name))
}

fn escape_css_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' | '\\' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            '\n' => escaped.push_str("\\a "),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_plain_values() {
        assert_eq!(attribute_selector("data-dz-upload", "cover"), r#"[data-dz-upload="cover"]"#);
        assert_eq!(input_by_name("upload_cover"), r#"input[name="upload_cover"]"#);
    }

    #[test]
    fn escapes_quotes_and_backslashes() {
        assert_eq!(attribute_selector("name", r#"a"b\c"#), r#"[name="a\"b\\c"]"#);
    }
}
