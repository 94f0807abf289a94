//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Endpoint URLs have the right scheme
//! - Value ranges (timeouts > 0, prefix representable)
//! - RWS owner is a decodable address
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is handed to the client

use std::fmt;

use crate::config::schema::ClientConfig;
use crate::encoding::ss58;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn check_url(field: &'static str, value: &str, schemes: &[&str], errors: &mut Vec<ValidationError>) {
    match url::Url::parse(value) {
        Ok(url) if schemes.contains(&url.scheme()) => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}', expected one of {:?}", url.scheme(), schemes),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", value, e))),
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url("node.remote_ws", &config.node.remote_ws, &["ws", "wss"], &mut errors);
    check_url("ipfs.api_gateway", &config.ipfs.api_gateway, &["http", "https"], &mut errors);
    check_url(
        "ipfs.content_gateway",
        &config.ipfs.content_gateway,
        &["http", "https"],
        &mut errors,
    );

    if config.node.ss58_prefix > 16_383 {
        errors.push(ValidationError::new("node.ss58_prefix", "must be at most 16383"));
    }
    if config.node.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("node.connect_timeout_secs", "must be greater than 0"));
    }
    if config.extrinsics.return_block_num && !config.extrinsics.wait_for_inclusion {
        errors.push(ValidationError::new(
            "extrinsics.return_block_num",
            "requires wait_for_inclusion",
        ));
    }
    if let Some(owner) = &config.extrinsics.rws_sub_owner {
        if ss58::decode(owner).is_err() {
            errors.push(ValidationError::new(
                "extrinsics.rws_sub_owner",
                format!("'{}' is not an ss58 address", owner),
            ));
        }
    }
    if config.subscriber.channel_capacity == 0 {
        errors.push(ValidationError::new("subscriber.channel_capacity", "must be greater than 0"));
    }
    if config.subscriber.resubscribe_base_delay_ms > config.subscriber.resubscribe_max_delay_ms {
        errors.push(ValidationError::new(
            "subscriber.resubscribe_base_delay_ms",
            "must not exceed resubscribe_max_delay_ms",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
