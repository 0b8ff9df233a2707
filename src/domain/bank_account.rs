use super::lenient;
use crate::error::{Result, ShopError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    #[default]
    Bank,
    /// Mobile financial service wallet.
    Mfs,
}

/// A seller's payout account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    #[serde(deserialize_with = "lenient::id")]
    pub id: u64,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub account_no: String,
    #[serde(default, rename = "type")]
    pub kind: AccountKind,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl BankAccount {
    /// The settlement note: bank name, else account name.
    pub fn settlement_note(&self) -> String {
        non_blank(&self.bank_name)
            .or_else(|| non_blank(&self.account_name))
            .unwrap_or_default()
            .to_string()
    }

    pub fn label(&self) -> String {
        let kind = match self.kind {
            AccountKind::Bank => "bank",
            AccountKind::Mfs => "mfs",
        };
        format!("#{} {} {} ({kind})", self.id, self.settlement_note(), self.account_no)
    }
}

/// Looks up the chosen account in the list loaded for the seller.
pub fn resolve_account(accounts: &[BankAccount], account_id: u64) -> Result<&BankAccount> {
    accounts
        .iter()
        .find(|a| a.id == account_id)
        .ok_or_else(|| ShopError::validation("Please select a valid bank account."))
}

/// The body of `POST /api/bank-accounts/add`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBankAccount {
    pub user_id: u64,
    #[serde(rename = "type")]
    pub kind: AccountKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    pub account_name: String,
    pub account_no: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl NewBankAccount {
    /// Bank accounts need a bank name and routing number; every account needs a
    /// holder name and an account number.
    pub fn validate(&self) -> Result<()> {
        if self.account_name.trim().is_empty() {
            return Err(ShopError::validation("Account name is required."));
        }
        if self.account_no.trim().is_empty() {
            return Err(ShopError::validation("Account number is required."));
        }
        if self.kind == AccountKind::Bank {
            if non_blank(&self.bank_name).is_none() {
                return Err(ShopError::validation("Bank name is required."));
            }
            if non_blank(&self.route).is_none() {
                return Err(ShopError::validation("Routing number is required."));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: u64, bank: Option<&str>, name: Option<&str>) -> BankAccount {
        BankAccount {
            id,
            user_id: Some(5),
            bank_name: bank.map(str::to_string),
            account_name: name.map(str::to_string),
            account_no: format!("00{id}"),
            kind: AccountKind::Bank,
            route: None,
            address: None,
        }
    }

    #[test]
    fn test_settlement_note_prefers_bank_name() {
        assert_eq!(account(1, Some("City Bank"), Some("Karim")).settlement_note(), "City Bank");
        assert_eq!(account(1, Some("  "), Some("Karim")).settlement_note(), "Karim");
        assert_eq!(account(1, None, None).settlement_note(), "");
    }

    #[test]
    fn test_resolve_account() {
        let accounts = vec![account(1, Some("A"), None), account(2, Some("B"), None)];
        assert_eq!(resolve_account(&accounts, 2).unwrap().id, 2);
        assert!(matches!(
            resolve_account(&accounts, 3),
            Err(ShopError::ValidationError(_))
        ));
    }

    #[test]
    fn test_deserialize_mfs_account() {
        let acc: BankAccount = serde_json::from_str(
            r#"{"id": "3", "type": "mfs", "account_name": "bKash", "account_no": "017"}"#,
        )
        .unwrap();
        assert_eq!(acc.kind, AccountKind::Mfs);
        assert_eq!(acc.settlement_note(), "bKash");
    }

    #[test]
    fn test_new_account_validation() {
        let mut new = NewBankAccount {
            user_id: 1,
            kind: AccountKind::Bank,
            bank_name: Some("City Bank".into()),
            account_name: "Karim".into(),
            account_no: "123".into(),
            route: None,
            address: None,
        };
        assert!(new.validate().is_err());
        new.route = Some("225".into());
        assert!(new.validate().is_ok());

        new.kind = AccountKind::Mfs;
        new.bank_name = None;
        new.route = None;
        assert!(new.validate().is_ok());
    }
}
