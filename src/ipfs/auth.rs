//! Web3 gateway authentication.
//!
//! The login is `sub-<ss58 address>` and the password is the account's
//! signature of its own ss58 address string.

use crate::chain::account::{create_keypair, Account};
use crate::chain::types::RobonomicsResult;
use crate::encoding::ss58;

/// Basic-auth credentials for a web3 IPFS gateway.
pub type Web3Credentials = (String, String);

/// Credentials for the account derived from `seed`.
pub fn web3_auth(seed: &str) -> RobonomicsResult<Web3Credentials> {
    let keypair = create_keypair(seed)?;
    let address = ss58::encode(ss58::ROBONOMICS_PREFIX, &keypair.public_key().0);
    let signature = keypair.sign(address.as_bytes());
    Ok((format!("sub-{}", address), format!("0x{}", hex::encode(signature.0))))
}

/// Credentials for an existing account.
pub fn web3_auth_for(account: &Account) -> RobonomicsResult<Web3Credentials> {
    let address = account.get_address()?;
    Ok((format!("sub-{}", address), account.sign(address.as_bytes())?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    #[test]
    fn test_login_names_the_account() {
        let (login, password) = web3_auth("//Alice").unwrap();
        let account = Account::new(Some("//Alice"), &ClientConfig::default()).unwrap();
        assert_eq!(login, format!("sub-{}", account.get_address().unwrap()));
        assert!(password.starts_with("0x"));
        assert_eq!(password.len(), 2 + 128);
    }

    #[test]
    fn test_account_credentials_match_seed_login() {
        let account = Account::new(Some("//Bob"), &ClientConfig::default()).unwrap();
        let (login, _) = web3_auth_for(&account).unwrap();
        assert_eq!(login, web3_auth("//Bob").unwrap().0);
    }

    #[test]
    fn test_read_only_account_has_no_credentials() {
        let account = Account::read_only(&ClientConfig::default());
        assert!(web3_auth_for(&account).is_err());
    }
}
