//! Input validation for channel names, chat messages, identities and keys

/// Maximum channel name length accepted by the service
pub const MAX_CHANNEL_NAME_LEN: usize = 250;

/// Maximum payload size of a single chat message, in bytes
pub const MAX_MESSAGE_BYTES: usize = 64 * 1024;

/// Maximum client identity length
pub const MAX_CLIENT_ID_LEN: usize = 128;

/// Validates a pub/sub channel name
pub fn validate_channel_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Channel name cannot be empty".to_string());
    }

    if name.len() > MAX_CHANNEL_NAME_LEN {
        return Err(format!(
            "Channel name too long (max {} characters)",
            MAX_CHANNEL_NAME_LEN
        ));
    }

    // Leading ':' and '[' are reserved for qualified and meta channels
    if name.starts_with(':') || name.starts_with('[') {
        return Err("Channel name cannot start with ':' or '['".to_string());
    }

    if name.contains(|c: char| c.is_control() || c == '*') {
        return Err("Channel name contains invalid characters".to_string());
    }

    Ok(())
}

/// Validates chat message text before publishing
pub fn validate_message(text: &str) -> Result<(), String> {
    if text.trim().is_empty() {
        return Err("Message cannot be empty".to_string());
    }

    if text.len() > MAX_MESSAGE_BYTES {
        return Err(format!(
            "Message too long (max {} bytes)",
            MAX_MESSAGE_BYTES
        ));
    }

    Ok(())
}

/// Validates the fixed client identity a token is bound to
pub fn validate_client_id(client_id: &str) -> Result<(), String> {
    if client_id.is_empty() {
        return Err("Client id cannot be empty".to_string());
    }
    if client_id == "*" {
        return Err("Wildcard client id is not allowed for a fixed identity".to_string());
    }
    if client_id.len() > MAX_CLIENT_ID_LEN {
        return Err(format!(
            "Client id too long (max {} characters)",
            MAX_CLIENT_ID_LEN
        ));
    }
    if client_id.contains(|c: char| c.is_control()) {
        return Err("Client id contains control characters".to_string());
    }
    Ok(())
}

/// Validates an API key of the form `appId.keyId:secret`
pub fn validate_api_key(key: &str) -> Result<(&str, &str), String> {
    let (name, secret) = key
        .split_once(':')
        .ok_or_else(|| "API key must be of the form keyName:keySecret".to_string())?;

    if name.is_empty() {
        return Err("API key name cannot be empty".to_string());
    }
    if secret.is_empty() {
        return Err("API key secret cannot be empty".to_string());
    }
    if name.contains(char::is_whitespace) || secret.contains(char::is_whitespace) {
        return Err("API key cannot contain whitespace".to_string());
    }

    Ok((name, secret))
}

/// Trim trailing newlines left behind by the Enter key
pub fn sanitize_message(text: &str) -> String {
    text.trim_end_matches(['\r', '\n']).to_string()
}
