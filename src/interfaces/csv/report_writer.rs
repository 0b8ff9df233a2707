use crate::domain::order::OrderLine;
use crate::domain::settlement::SettlementPlan;
use crate::domain::transaction::LedgerEntry;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct OrderLineRow<'a> {
    id: u64,
    order_id: Option<u64>,
    order_item_id: Option<u64>,
    product_name: &'a str,
    qty: u32,
    line_total: String,
    status: &'a str,
    created_at: Option<&'a str>,
    is_settled: bool,
}

#[derive(Serialize)]
struct PlanRow {
    order_id: u64,
    amount: String,
    items: usize,
    order_item_ids: String,
}

#[derive(Serialize)]
struct LedgerRow<'a> {
    id: u64,
    #[serde(rename = "type")]
    kind: &'a str,
    amount: String,
    source: Option<&'a str>,
    order_id: Option<u64>,
    trx_id: Option<&'a str>,
    note: Option<&'a str>,
    status: Option<&'a str>,
    created_at: Option<&'a str>,
}

/// Writes back-office tables as CSV.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_order_lines<'a, I>(&mut self, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a OrderLine>,
    {
        for line in lines {
            self.writer.serialize(OrderLineRow {
                id: line.id,
                order_id: line.resolved_order_id(),
                order_item_id: line.order_item_id,
                product_name: &line.product_name,
                qty: line.qty,
                line_total: line.line_total.to_string(),
                status: &line.status,
                created_at: line.created_at.as_deref(),
                is_settled: line.is_settled(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_plan(&mut self, plan: &SettlementPlan) -> Result<()> {
        for group in &plan.groups {
            let ids: Vec<String> = group.item_ids.iter().map(u64::to_string).collect();
            self.writer.serialize(PlanRow {
                order_id: group.order_id,
                amount: group.amount.to_string(),
                items: group.item_ids.len(),
                order_item_ids: ids.join(";"),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_ledger<'a, I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a LedgerEntry>,
    {
        for entry in entries {
            self.writer.serialize(LedgerRow {
                id: entry.id,
                kind: &entry.kind,
                amount: entry.amount.to_string(),
                source: entry.source.as_deref(),
                order_id: entry.order_id,
                trx_id: entry.trx_id.as_deref(),
                note: entry.note.as_deref(),
                status: entry.status.as_deref(),
                created_at: entry.created_at.as_deref(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
