//! Built-in name transforms for keys and enum constants

/// Split a name into words at separators and case boundaries
///
/// `HTTPServer` splits into `HTTP` and `Server`.
fn words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[must_use]
pub fn identity(name: &str) -> String {
    name.to_string()
}

/// `first_name` and `firstName` both become `first-name`
#[must_use]
pub fn kebab_case(name: &str) -> String {
    words(name)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

#[must_use]
pub fn snake_case(name: &str) -> String {
    words(name)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// `first_name` becomes `firstName`, `KIND_WORK` becomes `kindWork`
#[must_use]
pub fn camel_case(name: &str) -> String {
    words(name)
        .iter()
        .enumerate()
        .map(|(i, w)| if i == 0 { w.to_lowercase() } else { capitalize(w) })
        .collect()
}

/// Lowercase with underscores as dashes; `KIND_WORK` becomes `kind-work`
///
/// Unlike [`kebab_case`] this does not split on case changes.
#[must_use]
pub fn lower_kebab_case(name: &str) -> String {
    name.to_lowercase().replace('_', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_words() {
        assert_eq!(words("first_name"), vec!["first", "name"]);
        assert_eq!(words("firstName"), vec!["first", "Name"]);
        assert_eq!(words("HTTPServer"), vec!["HTTP", "Server"]);
        assert_eq!(words("KIND_WORK"), vec!["KIND", "WORK"]);
        assert_eq!(words("field2Name"), vec!["field2", "Name"]);
    }

    #[test]
    fn kebab() {
        assert_eq!(kebab_case("first_name"), "first-name");
        assert_eq!(kebab_case("firstName"), "first-name");
        assert_eq!(kebab_case("name"), "name");
    }

    #[test]
    fn snake() {
        assert_eq!(snake_case("firstName"), "first_name");
        assert_eq!(snake_case("HTTPServer"), "http_server");
    }

    #[test]
    fn camel() {
        assert_eq!(camel_case("first_name"), "firstName");
        assert_eq!(camel_case("KIND_WORK"), "kindWork");
        assert_eq!(camel_case("email"), "email");
    }

    #[test]
    fn lower_kebab() {
        assert_eq!(lower_kebab_case("KIND_WORK"), "kind-work");
        assert_eq!(lower_kebab_case("firstName"), "firstname");
    }
}
