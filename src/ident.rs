use heck::{ToPascalCase, ToSnakeCase};

pub enum CaseType {
    Snake,
    Pascal,
}

/// Words that can't be used as plain Rust identifiers.
const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final", "gen", "macro",
    "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Converts a sqlc query name to a Rust identifier with a given case. Names
/// starting with a digit get a `_` prefix and keywords become raw
/// identifiers.
pub fn query_to_rs_string(name: &str, case_type: CaseType) -> String {
    let prefix = if starts_with_number(name) { "_" } else { "" };
    let name = prefix.to_string()
        + &match case_type {
            CaseType::Snake => name.to_snake_case(),
            CaseType::Pascal => {
                // Preserve _ prefixes (heck removes them)
                if name.starts_with('_') {
                    "_".to_owned() + &name.to_pascal_case()
                } else {
                    name.to_pascal_case()
                }
            }
        };

    if RUST_KEYWORDS.contains(&name.as_str()) {
        "r#".to_owned() + &name
    } else {
        name
    }
}

/// Names to try, in order, when looking up a query typed by a user who may
/// have used the generated method name instead of the query name.
pub fn lookup_candidates(input: &str) -> Vec<String> {
    let mut candidates = vec![input.to_string()];

    let pascal = input.trim_start_matches("r#").to_pascal_case();
    if !candidates.contains(&pascal) {
        candidates.push(pascal);
    }

    candidates
}

fn starts_with_number(s: &str) -> bool {
    s.chars().next().map(|c| c.is_numeric()).unwrap_or(false)
}
