use crate::utils::error::{DiscoveryError, Result};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Checks that `scheme://<host>` would form an absolute URL with a usable scheme.
pub fn validate_scheme(field_name: &str, scheme: &str) -> Result<()> {
    if scheme.is_empty() {
        return Err(DiscoveryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: scheme.to_string(),
            reason: "Scheme cannot be empty".to_string(),
        });
    }

    match Url::parse(&format!("{}://grader-dbis.example.com", scheme)) {
        Ok(url) if url.scheme() == scheme.to_ascii_lowercase() && url.has_host() => Ok(()),
        Ok(_) => Err(DiscoveryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: scheme.to_string(),
            reason: "Scheme does not produce a URL with a host".to_string(),
        }),
        Err(e) => Err(DiscoveryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: scheme.to_string(),
            reason: format!("Invalid URL scheme: {}", e),
        }),
    }
}

pub fn validate_command(field_name: &str, argv: &[String]) -> Result<()> {
    match argv.first() {
        None => Err(DiscoveryError::MissingConfigError {
            field: field_name.to_string(),
        }),
        Some(program) if program.trim().is_empty() => Err(DiscoveryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: program.clone(),
            reason: "Program name cannot be empty".to_string(),
        }),
        Some(program) if program.contains('\0') => Err(DiscoveryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: program.clone(),
            reason: "Program name contains null bytes".to_string(),
        }),
        Some(_) => Ok(()),
    }
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(DiscoveryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DiscoveryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_hostnames(field_name: &str, hosts: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for host in hosts {
        validate_non_empty_string(field_name, host)?;
        if host.chars().any(char::is_whitespace) {
            return Err(DiscoveryError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: host.clone(),
                reason: "Hostname cannot contain whitespace".to_string(),
            });
        }
        if !seen.insert(host.as_str()) {
            tracing::warn!("Duplicate entry '{}' in {}", host, field_name);
        }
    }
    Ok(())
}
