use secrecy::{ExposeSecret, SecretString};

/// Format a secret value, respecting the show_secrets flag.
pub fn format_secret(secret: &SecretString, show_secrets: bool) -> String {
    if show_secrets {
        secret.expose_secret().to_string()
    } else {
        "[REDACTED]".to_string()
    }
}

/// Format an optional secret value.
pub fn format_optional_secret(secret: Option<&SecretString>, show_secrets: bool) -> String {
    match secret {
        Some(s) => format_secret(s, show_secrets),
        None => "(not set)".to_string(),
    }
}

/// Redact `PWD=` attributes in an ODBC connection string.
pub fn mask_connection_string(conn_str: &str, show_secrets: bool) -> String {
    if show_secrets {
        return conn_str.to_string();
    }
    split_attributes(conn_str)
        .into_iter()
        .map(|attr| match attr.split_once('=') {
            Some((key, _)) if key.trim().eq_ignore_ascii_case("pwd") => {
                format!("{key}=[REDACTED]")
            }
            _ => attr.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Split on `;` outside of `{...}` quoted attribute values (`}}` escapes `}`).
fn split_attributes(conn_str: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_braces = false;
    let mut chars = conn_str.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        match ch {
            '{' if !in_braces => in_braces = true,
            '}' if in_braces => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                } else {
                    in_braces = false;
                }
            }
            ';' if !in_braces => {
                parts.push(&conn_str[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&conn_str[start..]);
    parts
}
