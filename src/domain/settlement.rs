use super::bank_account::BankAccount;
use super::money::{Amount, Money};
use super::order::OrderLine;
use crate::error::{Result, ShopError};
use serde::Serialize;

pub const MISSING_ORDER_INFO: &str = "Selected rows are missing order information.";

/// Selected lines of one parent order, summed for a single settlement request.
///
/// Built fresh for every settlement attempt and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementGroup {
    pub order_id: u64,
    pub amount: Money,
    pub item_ids: Vec<u64>,
}

/// The groups derived from a selection, in first-encounter order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettlementPlan {
    pub groups: Vec<SettlementGroup>,
    /// Rows left out because no parent order id could be resolved.
    pub dropped: usize,
}

impl SettlementPlan {
    pub fn total(&self) -> Result<Money> {
        Money::checked_sum(self.groups.iter().map(|g| g.amount))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Groups selected rows by parent order.
///
/// Rows without an order id are skipped and counted in `dropped`. Groups keep
/// the order in which their order id was first seen. Fails with a validation
/// error if a group total does not fit in a decimal.
pub fn group_selected_rows<'a, I>(rows: I) -> Result<SettlementPlan>
where
    I: IntoIterator<Item = &'a OrderLine>,
{
    let mut plan = SettlementPlan::default();
    for row in rows {
        let Some(order_id) = row.resolved_order_id() else {
            plan.dropped += 1;
            continue;
        };
        // Linear scan keeps first-seen order.
        match plan.groups.iter_mut().find(|g| g.order_id == order_id) {
            Some(group) => {
                group.amount = group.amount.checked_add(row.line_total)?;
                group.item_ids.push(row.settlement_item_id());
            }
            None => plan.groups.push(SettlementGroup {
                order_id,
                amount: row.line_total,
                item_ids: vec![row.settlement_item_id()],
            }),
        }
    }
    Ok(plan)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementKind {
    Settlement,
    SettlementReversal,
}

impl SettlementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Settlement => "settlement",
            Self::SettlementReversal => "settlement_reversal",
        }
    }
}

/// The body of a settlement (or reversal) request for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementRequest {
    pub amount: Amount,
    pub note: String,
    pub ref_id: String,
    pub trx_id: String,
    pub order_id: u64,
    pub source: &'static str,
    #[serde(rename = "type")]
    pub kind: SettlementKind,
    pub order_item_ids: Vec<u64>,
}

impl SettlementRequest {
    /// Builds the request for a group, checking it is fit to be sent.
    pub fn for_group(group: &SettlementGroup, account: &BankAccount) -> Result<Self> {
        if group.item_ids.is_empty() {
            return Err(ShopError::validation(format!(
                "Order {} has no items to settle.",
                group.order_id
            )));
        }
        let amount = Amount::try_from(group.amount).map_err(|_| {
            ShopError::validation(format!(
                "Settlement amount for order {} must be positive.",
                group.order_id
            ))
        })?;
        Ok(Self {
            amount,
            note: account.settlement_note(),
            ref_id: account.id.to_string(),
            trx_id: account.account_no.clone(),
            order_id: group.order_id,
            source: "wallet",
            kind: SettlementKind::Settlement,
            order_item_ids: group.item_ids.clone(),
        })
    }

    /// The compensating request that undoes this one.
    pub fn reversal(&self) -> Self {
        Self {
            kind: SettlementKind::SettlementReversal,
            ..self.clone()
        }
    }

    /// Form fields, with `order_item_ids[]` repeated once per item.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("amount".to_string(), self.amount.to_string()),
            ("note".to_string(), self.note.clone()),
            ("ref_id".to_string(), self.ref_id.clone()),
            ("trx_id".to_string(), self.trx_id.clone()),
            ("order_id".to_string(), self.order_id.to_string()),
            ("source".to_string(), self.source.to_string()),
            ("type".to_string(), self.kind.as_str().to_string()),
        ];
        fields.extend(
            self.order_item_ids
                .iter()
                .map(|id| ("order_item_ids[]".to_string(), id.to_string())),
        );
        fields
    }
}

/// What to do with already committed groups when a later group fails.
///
/// Committed groups are left in place unless reversal is asked for; the
/// reversal endpoint is not part of every backend deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompensationPolicy {
    /// Send a reversal for each committed group, newest first.
    Reverse,
    /// Leave committed groups in place.
    #[default]
    None,
}

/// The outcome of a fully successful settlement run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettlementReceipt {
    pub settled_orders: Vec<u64>,
    pub total: Money,
    pub dropped_rows: usize,
    pub message: String,
}

/// The outcome of a settlement run that stopped on a failing group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettlementFailure {
    /// The message of the error that stopped the run.
    pub message: String,
    /// The group the run stopped at. On cancellation it was never sent.
    pub failed_order: u64,
    /// Groups that the backend accepted before the failure.
    pub committed: Vec<u64>,
    /// Committed groups whose reversal was accepted.
    pub compensated: Vec<u64>,
    /// Committed groups still settled server-side.
    pub uncompensated: Vec<u64>,
    /// Groups after `failed_order`, never sent.
    pub skipped: Vec<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bank_account::AccountKind;
    use crate::domain::order::Order;
    use rust_decimal_macros::dec;

    fn line(id: u64, order_id: Option<u64>, total: rust_decimal::Decimal) -> OrderLine {
        OrderLine {
            id,
            order_id,
            order_item_id: Some(id * 10),
            product_name: format!("item {id}"),
            qty: 1,
            line_total: Money::new(total),
            status: "delivered".into(),
            created_at: None,
            settled: false,
            order: None,
        }
    }

    fn account() -> BankAccount {
        BankAccount {
            id: 3,
            user_id: Some(7),
            bank_name: Some("City Bank".into()),
            account_name: Some("Karim".into()),
            account_no: "0012".into(),
            kind: AccountKind::Bank,
            route: Some("225".into()),
            address: None,
        }
    }

    #[test]
    fn test_groups_by_order_in_insertion_order() {
        let rows = vec![
            line(1, Some(1), dec!(50)),
            line(2, Some(1), dec!(30)),
            line(3, Some(2), dec!(20)),
        ];
        let plan = group_selected_rows(&rows).unwrap();

        assert_eq!(plan.groups.len(), 2);
        assert_eq!(plan.groups[0].order_id, 1);
        assert_eq!(plan.groups[0].amount, Money::new(dec!(80)));
        assert_eq!(plan.groups[0].item_ids, vec![10, 20]);
        assert_eq!(plan.groups[1].order_id, 2);
        assert_eq!(plan.groups[1].amount, Money::new(dec!(20)));
        assert_eq!(plan.total().unwrap(), Money::new(dec!(100)));
    }

    #[test]
    fn test_group_total_overflow_is_rejected() {
        let rows = vec![
            line(1, Some(1), rust_decimal::Decimal::MAX),
            line(2, Some(1), rust_decimal::Decimal::MAX),
        ];
        let err = group_selected_rows(&rows).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Amount is too large.");

        // Separate orders fit individually; only the plan total overflows.
        let rows = vec![
            line(1, Some(1), rust_decimal::Decimal::MAX),
            line(2, Some(2), rust_decimal::Decimal::MAX),
        ];
        let plan = group_selected_rows(&rows).unwrap();
        assert!(plan.total().is_err());
    }

    #[test]
    fn test_rows_without_order_are_dropped() {
        let rows = vec![line(1, None, dec!(10)), line(2, Some(4), dec!(5))];
        let plan = group_selected_rows(&rows).unwrap();
        assert_eq!(plan.dropped, 1);
        assert_eq!(plan.groups.len(), 1);
        assert_eq!(plan.groups[0].order_id, 4);

        let plan = group_selected_rows(&rows[..1]).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_interleaved_orders_keep_first_seen_order() {
        let rows = vec![
            line(1, Some(9), dec!(1)),
            line(2, Some(3), dec!(1)),
            line(3, Some(9), dec!(1)),
        ];
        let ids: Vec<u64> = group_selected_rows(&rows)
            .unwrap()
            .groups
            .iter()
            .map(|g| g.order_id)
            .collect();
        assert_eq!(ids, vec![9, 3]);
    }

    #[test]
    fn test_nested_order_used_for_grouping() {
        let mut row = line(1, None, dec!(10));
        row.order = Some(Order {
            id: Some(5),
            ..Default::default()
        });
        let plan = group_selected_rows([&row]).unwrap();
        assert_eq!(plan.groups[0].order_id, 5);
    }

    #[test]
    fn test_request_form_fields() {
        let group = SettlementGroup {
            order_id: 1,
            amount: Money::new(dec!(80)),
            item_ids: vec![10, 20],
        };
        let request = SettlementRequest::for_group(&group, &account()).unwrap();
        let fields = request.form_fields();

        assert!(fields.contains(&("note".into(), "City Bank".into())));
        assert!(fields.contains(&("source".into(), "wallet".into())));
        assert!(fields.contains(&("type".into(), "settlement".into())));
        assert!(fields.contains(&("ref_id".into(), "3".into())));
        assert!(fields.contains(&("trx_id".into(), "0012".into())));
        let items: Vec<&str> = fields
            .iter()
            .filter(|(k, _)| k == "order_item_ids[]")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(items, vec!["10", "20"]);

        let reversal = request.reversal();
        assert_eq!(reversal.kind, SettlementKind::SettlementReversal);
        assert_eq!(reversal.amount, request.amount);
    }

    #[test]
    fn test_non_positive_group_is_rejected() {
        let group = SettlementGroup {
            order_id: 1,
            amount: Money::ZERO,
            item_ids: vec![10],
        };
        let err = SettlementRequest::for_group(&group, &account()).unwrap_err();
        assert!(err.is_validation());
    }
}
