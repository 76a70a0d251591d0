//! Default column name derivation.

const CONNECTOR: char = '_';

fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '-' | '_')
}

fn push_lower(out: &mut String, c: char) {
    out.extend(c.to_lowercase());
}

/// Converts a mixed-case identifier into lowercase `snake_case`.
///
/// Runs of capitals are treated as an abbreviation followed by a word, so
/// `HTTPServer` becomes `http_server`. Digits count as a boundary after
/// letters (`Int8` becomes `int_8`, `HTTP2XX` becomes `http_2xx`). Spaces
/// and hyphens are treated as underscores.
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut chars = name.chars();
    // Last character consumed, used to decide where connectors go.
    let mut last = CONNECTOR;

    while let Some(current) = chars.next() {
        let prev = last;
        last = current;

        if current.is_uppercase() {
            if prev != CONNECTOR && !prev.is_numeric() {
                out.push(CONNECTOR);
            }
            push_lower(&mut out, current);

            let Some(next) = chars.next() else {
                break;
            };
            last = next;
            if !next.is_uppercase() {
                if is_separator(next) {
                    out.push(CONNECTOR);
                    last = CONNECTOR;
                } else {
                    out.push(next);
                }
                continue;
            }

            // Inside a run of capitals: `held` is written once the character
            // after it is known.
            loop {
                let held = last;
                match chars.next() {
                    None => {
                        push_lower(&mut out, held);
                        break;
                    }
                    Some(c) if c.is_uppercase() => {
                        push_lower(&mut out, held);
                        last = c;
                    }
                    Some(c) if is_separator(c) => {
                        push_lower(&mut out, held);
                        out.push(CONNECTOR);
                        last = CONNECTOR;
                        break;
                    }
                    Some(c) if c.is_numeric() => {
                        push_lower(&mut out, held);
                        out.push(CONNECTOR);
                        out.push(c);
                        last = c;
                        break;
                    }
                    Some(c) => {
                        out.push(CONNECTOR);
                        push_lower(&mut out, held);
                        out.push(c);
                        last = c;
                        break;
                    }
                }
            }
        } else if current.is_numeric() {
            if prev != CONNECTOR && !prev.is_numeric() {
                out.push(CONNECTOR);
            }
            out.push(current);
        } else if is_separator(current) {
            out.push(CONNECTOR);
            last = CONNECTOR;
        } else {
            out.push(current);
        }
    }

    out
}

/// Lowercases the field name without inserting separators.
pub fn lowercase(name: &str) -> String {
    name.to_lowercase()
}
