use super::{types::Config, AuthMethod, ConfigError, MessagingBackend};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - API key present when api_key auth is selected
/// - Fees and fallback amount are not negative and within orders.max_amount
/// - Completion pattern compiles
/// - Webhook settings present when the webhook backend is selected
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::ApiKey
        && config.auth.api_key.as_deref().unwrap_or("").is_empty()
    {
        return Err(ConfigError::ValidationError(
            "auth.api_key must be set when method = \"api_key\"".to_string(),
        ));
    }

    for (name, amount) in [
        ("orders.doordash_fee", config.orders.doordash_fee),
        ("orders.ubereats_fee", config.orders.ubereats_fee),
        ("orders.fallback_amount", config.orders.fallback_amount),
    ] {
        if amount.is_sign_negative() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be negative",
                name
            )));
        }
        if amount > config.orders.max_amount {
            return Err(ConfigError::ValidationError(format!(
                "{} exceeds orders.max_amount ({})",
                name, config.orders.max_amount
            )));
        }
    }

    if let Err(e) = regex_lite::Regex::new(&config.orders.completion_pattern) {
        return Err(ConfigError::ValidationError(format!(
            "orders.completion_pattern is not a valid regex: {}",
            e
        )));
    }

    if config.messaging.backend == MessagingBackend::Webhook {
        match &config.messaging.webhook {
            Some(webhook) if !webhook.url.is_empty() => {}
            _ => {
                return Err(ConfigError::ValidationError(
                    "messaging.webhook.url must be set when backend = \"webhook\"".to_string(),
                ))
            }
        }
    }

    Ok(())
}
