//! Path resolution for grouptree's files.

/// Resolve the config file path.
/// Checks `GROUPTREE_CONFIG` env var, falls back to `$HOME/.grouptree/config.toml`.
pub fn config_path() -> String {
    std::env::var("GROUPTREE_CONFIG").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/.grouptree/config.toml")
    })
}

/// True when a snapshot argument means standard input.
pub fn is_stdin(path: &str) -> bool {
    path == "-"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_is_stdin() {
        assert!(is_stdin("-"));
        assert!(!is_stdin("groups.json"));
        assert!(!is_stdin("./-"));
    }
}
