//! Link parameter validation
//!
//! Pure predicates over raw parameter values. [`validate_config`] runs them
//! in a fixed order (port, baud, data bits, parity, stop bits, handshake)
//! and reports the first field that fails.

use super::{
    ConfigField, ExchangeError, Handshake, LinkConfig, Parity, PortEnumerator, StopBits,
    MAX_BAUD_RATE,
};

/// True if `name` is one of the ports the enumerator currently reports
pub fn is_port_name_valid(name: &str, ports: &dyn PortEnumerator) -> bool {
    ports.port_names().iter().any(|p| p == name)
}

/// True if `0 < rate <= 115200`
pub fn is_baud_rate_valid(rate: u32) -> bool {
    rate > 0 && rate <= MAX_BAUD_RATE
}

/// True if `bits` is 5, 6, 7 or 8
pub fn is_data_bits_valid(bits: u8) -> bool {
    matches!(bits, 5..=8)
}

/// True if `code` names a [`Parity`] variant
pub fn is_parity_valid(code: u8) -> bool {
    Parity::try_from(code).is_ok()
}

/// True if `code` names a [`StopBits`] variant
pub fn is_stop_bits_valid(code: u8) -> bool {
    StopBits::try_from(code).is_ok()
}

/// True if `code` names a [`Handshake`] variant
pub fn is_handshake_valid(code: u8) -> bool {
    Handshake::try_from(code).is_ok()
}

/// Check every field of `config`, failing on the first violation
pub fn validate_config(config: &LinkConfig, ports: &dyn PortEnumerator) -> Result<(), ExchangeError> {
    if !is_port_name_valid(&config.port_name, ports) {
        return Err(ExchangeError::invalid(ConfigField::PortName, &config.port_name));
    }
    if !is_baud_rate_valid(config.baud_rate) {
        return Err(ExchangeError::invalid(ConfigField::BaudRate, config.baud_rate));
    }
    if !is_data_bits_valid(config.data_bits) {
        return Err(ExchangeError::invalid(ConfigField::DataBits, config.data_bits));
    }
    if !is_parity_valid(config.parity.code()) {
        return Err(ExchangeError::invalid(ConfigField::Parity, config.parity));
    }
    if !is_stop_bits_valid(config.stop_bits.code()) {
        return Err(ExchangeError::invalid(ConfigField::StopBits, config.stop_bits));
    }
    if !is_handshake_valid(config.handshake.code()) {
        return Err(ExchangeError::invalid(ConfigField::Handshake, config.handshake));
    }
    Ok(())
}
