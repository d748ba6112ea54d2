use murmur_config::{MurmurConfig, Severity, to_toml_string, validate};

/// Print the effective config as TOML followed by validation diagnostics.
pub fn show(config: &MurmurConfig) -> anyhow::Result<()> {
    print!("{}", to_toml_string(config)?);
    ensure_valid(config)
}

/// Report validation diagnostics on stderr and fail if any is an error.
pub fn ensure_valid(config: &MurmurConfig) -> anyhow::Result<()> {
    let result = validate(config);
    for diag in &result.diagnostics {
        eprintln!("{}: {}: {}", diag.severity, diag.path, diag.message);
    }
    if result.has_errors() {
        let errors = result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        anyhow::bail!("configuration has {errors} error(s)");
    }
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        ensure_valid(&MurmurConfig::default()).unwrap();
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut config = MurmurConfig::default();
        config.collector.max_messages = 0;
        let err = ensure_valid(&config).unwrap_err();
        assert!(err.to_string().contains("1 error"), "{err}");
    }
}
