//! Wallet address generation.
//!
//! Addresses are 32 bytes drawn from the operating system's secure random
//! source. A seeded or time-based generator must never be used here.

use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::AddressError;
use crate::models::{ADDRESS_BYTES, Address};

/// Generate a fresh wallet address.
pub fn generate_address() -> Result<Address, AddressError> {
    let mut buffer = [0u8; ADDRESS_BYTES];
    OsRng
        .try_fill_bytes(&mut buffer)
        .map_err(|e| AddressError::Generation(e.to_string()))?;
    Ok(Address(buffer))
}

/// Generate `count` distinct wallet addresses.
pub fn generate_addresses(count: usize) -> Result<Vec<Address>, AddressError> {
    let mut addresses = Vec::with_capacity(count);
    while addresses.len() < count {
        let address = generate_address()?;
        if !addresses.contains(&address) {
            addresses.push(address);
        }
    }
    Ok(addresses)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_address_is_lowercase_hex() {
        let address = generate_address().unwrap();
        let hex = address.to_hex();
        assert_eq!(hex.len(), 64);
        assert!(Address::is_valid(&hex));
        assert_eq!(Address::parse(&hex).unwrap(), address);
    }

    // Deux tirages consécutifs ne doivent jamais coïncider
    #[test]
    fn test_generated_addresses_are_distinct() {
        let addresses = generate_addresses(10).unwrap();
        assert_eq!(addresses.len(), 10);
        for (i, a) in addresses.iter().enumerate() {
            assert!(addresses[i + 1..].iter().all(|b| a != b));
        }
    }
}
