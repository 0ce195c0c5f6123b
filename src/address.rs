use crate::error::ConnectorError;
pub use alloy_primitives::Address;

const NO_CHAIN_ID: Option<u64> = None;

/// Parse an account address as returned by the provider.
///
/// The address must be `0x` followed by 40 hexadecimal digits. Addresses in a
/// single case are accepted as is, mixed case addresses must carry a valid
/// EIP-55 checksum.
pub fn normalize_address(address: &str) -> Result<Address, ConnectorError> {
    let invalid = || ConnectorError::InvalidAddress {
        address: address.to_owned(),
    };

    let Some(digits) = address.strip_prefix("0x") else {
        return Err(invalid());
    };
    if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());

    if has_lower && has_upper {
        Address::parse_checksummed(address, NO_CHAIN_ID).map_err(|_| invalid())
    } else {
        address.parse::<Address>().map_err(|_| invalid())
    }
}

pub fn normalize_addresses<I, S>(addresses: I) -> Result<Vec<Address>, ConnectorError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    addresses
        .into_iter()
        .map(|address| normalize_address(address.as_ref()))
        .collect()
}

/// EIP-55 checksummed representation of the address
pub fn checksummed(address: &Address) -> String {
    address.to_checksum(NO_CHAIN_ID)
}
