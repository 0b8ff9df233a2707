use super::scope::FetchScope;
use crate::domain::bank_account::BankAccount;
use crate::domain::money::Money;
use crate::domain::order::OrderLine;
use crate::domain::ports::SettlementGatewayBox;
use crate::domain::settlement::{
    CompensationPolicy, MISSING_ORDER_INFO, SettlementFailure, SettlementPlan, SettlementReceipt,
    SettlementRequest, group_selected_rows,
};
use crate::error::{Result, ShopError};
use tracing::{error, info, instrument, warn};

/// A validated settlement, ready to be submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSettlement {
    pub seller_id: String,
    pub plan: SettlementPlan,
    pub total: Money,
    pub requests: Vec<SettlementRequest>,
}

/// Checks the preconditions and turns the selection into one request per order.
///
/// Nothing here touches the network, so every error is a validation error.
pub fn prepare(
    seller_id: &str,
    account: Option<&BankAccount>,
    selected_rows: &[OrderLine],
) -> Result<PreparedSettlement> {
    let seller_id = seller_id.trim();
    if seller_id.is_empty() {
        return Err(ShopError::validation("Seller id is required."));
    }
    let account =
        account.ok_or_else(|| ShopError::validation("Please select a valid bank account."))?;
    if selected_rows.is_empty() {
        return Err(ShopError::validation("Please select at least one order line."));
    }

    let plan = group_selected_rows(selected_rows)?;
    if plan.dropped > 0 {
        warn!(dropped = plan.dropped, "selected rows without an order id were left out");
    }
    if plan.is_empty() {
        return Err(ShopError::validation(MISSING_ORDER_INFO));
    }

    let total = plan.total()?;
    let requests = plan
        .groups
        .iter()
        .map(|group| SettlementRequest::for_group(group, account))
        .collect::<Result<Vec<_>>>()?;

    Ok(PreparedSettlement {
        seller_id: seller_id.to_string(),
        plan,
        total,
        requests,
    })
}

/// Submits prepared settlements one order at a time.
///
/// Each accepted request is remembered together with its reversal. If a later
/// request fails, the remaining ones are never sent and, under
/// [`CompensationPolicy::Reverse`], the remembered reversals are sent newest
/// first.
pub struct SettlementService {
    gateway: SettlementGatewayBox,
    policy: CompensationPolicy,
}

impl SettlementService {
    pub fn new(gateway: SettlementGatewayBox) -> Self {
        Self {
            gateway,
            policy: CompensationPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CompensationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> CompensationPolicy {
        self.policy
    }

    #[instrument(skip_all, fields(seller = %prepared.seller_id, groups = prepared.requests.len()))]
    pub async fn submit(
        &self,
        prepared: PreparedSettlement,
        scope: &FetchScope,
    ) -> Result<SettlementReceipt> {
        let PreparedSettlement {
            seller_id,
            plan,
            total,
            requests,
        } = prepared;

        let mut committed: Vec<SettlementRequest> = Vec::with_capacity(requests.len());
        for (index, request) in requests.iter().enumerate() {
            // Cancellation is checked between groups only. An accepted request
            // is always recorded as committed.
            if scope.is_cancelled() {
                warn!(order_id = request.order_id, "settlement cancelled before this order");
                let failure = self
                    .unwind(
                        &seller_id,
                        &committed,
                        &requests[index + 1..],
                        request,
                        ShopError::Cancelled,
                    )
                    .await;
                return Err(failure.into());
            }
            info!(order_id = request.order_id, amount = %request.amount, "submitting settlement");
            if let Err(cause) = self.gateway.settle(&seller_id, request).await {
                error!(order_id = request.order_id, error = %cause, "settlement request failed");
                let failure = self
                    .unwind(&seller_id, &committed, &requests[index + 1..], request, cause)
                    .await;
                return Err(failure.into());
            }
            committed.push(request.clone());
        }

        let settled_orders: Vec<u64> = committed.iter().map(|r| r.order_id).collect();
        info!(orders = settled_orders.len(), %total, "settlement complete");
        Ok(SettlementReceipt {
            message: format!("Settlement submitted for {} order(s).", settled_orders.len()),
            settled_orders,
            total,
            dropped_rows: plan.dropped,
        })
    }

    async fn unwind(
        &self,
        seller_id: &str,
        committed: &[SettlementRequest],
        skipped: &[SettlementRequest],
        failed: &SettlementRequest,
        cause: ShopError,
    ) -> SettlementFailure {
        let mut failure = SettlementFailure {
            message: cause.to_string(),
            failed_order: failed.order_id,
            committed: committed.iter().map(|r| r.order_id).collect(),
            compensated: Vec::new(),
            uncompensated: Vec::new(),
            skipped: skipped.iter().map(|r| r.order_id).collect(),
        };

        match self.policy {
            CompensationPolicy::None => {
                failure.uncompensated = failure.committed.clone();
            }
            CompensationPolicy::Reverse => {
                // Reversals are not tied to the caller's scope; they must be attempted.
                for request in committed.iter().rev() {
                    match self.gateway.reverse(seller_id, &request.reversal()).await {
                        Ok(()) => {
                            info!(order_id = request.order_id, "settlement reversed");
                            failure.compensated.push(request.order_id);
                        }
                        Err(e) => {
                            error!(
                                order_id = request.order_id,
                                error = %e,
                                "settlement reversal failed"
                            );
                            failure.uncompensated.push(request.order_id);
                        }
                    }
                }
            }
        }

        if !failure.uncompensated.is_empty() {
            warn!(
                orders = ?failure.uncompensated,
                "settlements remain committed after a failed run"
            );
        }
        failure
    }
}
