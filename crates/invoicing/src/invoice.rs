use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billing_core::{CustomerId, DomainError, DomainResult, Entity, InvoiceId, ProductId};

/// Invoice status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Paid,
    Pending,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Pending => "Pending",
            InvoiceStatus::Cancelled => "Cancelled",
        }
    }
}

impl core::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for InvoiceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paid" => Ok(InvoiceStatus::Paid),
            "pending" => Ok(InvoiceStatus::Pending),
            "cancelled" | "canceled" => Ok(InvoiceStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown invoice status '{other}' (expected Paid, Pending or Cancelled)"
            ))),
        }
    }
}

/// Line item owned by an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Decimal,
    /// Back-reference to the owning invoice (non-owning).
    pub invoice_id: InvoiceId,
}

impl InvoiceItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Input line for [`Invoice::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoiceItem {
    pub product_id: Option<ProductId>,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Input for [`Invoice::create`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoice {
    pub customer_id: Option<CustomerId>,
    pub items: Vec<NewInvoiceItem>,
    /// Amount already settled at creation time (defaults to zero).
    #[serde(default)]
    pub paid_amount: Option<Decimal>,
}

impl NewInvoice {
    /// Run every creation check without binding the input to an id.
    pub fn validate(&self) -> DomainResult<()> {
        self.prepare().map(drop)
    }

    fn prepare(&self) -> DomainResult<PreparedInvoice> {
        if self.items.is_empty() {
            return Err(DomainError::invalid_invoice("no items"));
        }

        let customer_id = self
            .customer_id
            .ok_or_else(|| DomainError::invalid_invoice("no customer"))?;

        let mut lines = Vec::with_capacity(self.items.len());
        let mut total = Decimal::ZERO;
        for item in &self.items {
            let product_id = item
                .product_id
                .ok_or_else(|| DomainError::invalid_invoice("missing product id"))?;
            if item.quantity == 0 {
                return Err(DomainError::invalid_invoice("quantity must be positive"));
            }
            if item.unit_price < Decimal::ZERO {
                return Err(DomainError::invalid_invoice("unit price must not be negative"));
            }
            let line = item
                .unit_price
                .checked_mul(Decimal::from(item.quantity))
                .ok_or_else(|| DomainError::invalid_invoice("invoice line amount overflow"))?;
            total = total
                .checked_add(line)
                .ok_or_else(|| DomainError::invalid_invoice("invoice total overflow"))?;
            lines.push((product_id, item.quantity, item.unit_price));
        }

        let paid_amount = self.paid_amount.unwrap_or(Decimal::ZERO);
        if paid_amount < Decimal::ZERO {
            return Err(DomainError::invalid_invoice("paid amount must not be negative"));
        }
        if paid_amount > total {
            return Err(DomainError::invalid_invoice("paid amount exceeds invoice total"));
        }

        Ok(PreparedInvoice {
            customer_id,
            lines,
            paid_amount,
        })
    }
}

struct PreparedInvoice {
    customer_id: CustomerId,
    lines: Vec<(ProductId, u32, Decimal)>,
    paid_amount: Decimal,
}

/// Invoice: a customer's bill made of line items.
///
/// # Invariants
/// - `items` is non-empty and every item points back at this invoice.
/// - The total is always derived from `items`; it is never stored separately.
/// - `0 <= paid_amount <= total_amount()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    id: InvoiceId,
    customer_id: CustomerId,
    items: Vec<InvoiceItem>,
    status: InvoiceStatus,
    paid_amount: Decimal,
    created_at: DateTime<Utc>,
}

impl Invoice {
    /// Validate `input` and build a new invoice.
    ///
    /// Status starts as `Paid` regardless of `paid_amount`; callers move it with
    /// [`Invoice::set_status`].
    pub fn create(id: InvoiceId, input: &NewInvoice, created_at: DateTime<Utc>) -> DomainResult<Self> {
        let prepared = input.prepare()?;

        let items = prepared
            .lines
            .into_iter()
            .map(|(product_id, quantity, unit_price)| InvoiceItem {
                product_id,
                quantity,
                unit_price,
                invoice_id: id,
            })
            .collect();

        Ok(Self {
            id,
            customer_id: prepared.customer_id,
            items,
            status: InvoiceStatus::Paid,
            paid_amount: prepared.paid_amount,
            created_at,
        })
    }

    pub fn id(&self) -> InvoiceId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn items(&self) -> &[InvoiceItem] {
        &self.items
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn paid_amount(&self) -> Decimal {
        self.paid_amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Sum of `quantity * unit_price` over all items.
    pub fn total_amount(&self) -> Decimal {
        self.items.iter().map(InvoiceItem::line_total).sum()
    }

    pub fn outstanding_amount(&self) -> Decimal {
        self.total_amount() - self.paid_amount
    }

    pub fn is_outstanding(&self) -> bool {
        self.total_amount() > self.paid_amount
    }

    /// Apply a payment against the outstanding balance.
    ///
    /// Cancelled invoices don't accept payments, and payments can't exceed what is owed.
    /// The status is left untouched; it only changes through [`Invoice::set_status`].
    pub fn register_payment(&mut self, amount: Decimal) -> DomainResult<()> {
        if self.status == InvoiceStatus::Cancelled {
            return Err(DomainError::invalid_invoice(
                "cannot register payment on cancelled invoice",
            ));
        }
        if amount <= Decimal::ZERO {
            return Err(DomainError::invalid_invoice("payment amount must be positive"));
        }

        let new_paid = self
            .paid_amount
            .checked_add(amount)
            .ok_or_else(|| DomainError::invalid_invoice("payment total overflow"))?;
        if new_paid > self.total_amount() {
            return Err(DomainError::invalid_invoice("cannot overpay invoice"));
        }

        self.paid_amount = new_paid;
        Ok(())
    }

    pub fn set_status(&mut self, status: InvoiceStatus) {
        self.status = status;
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    fn money(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn line(product: u64, quantity: u32, unit_price: Decimal) -> NewInvoiceItem {
        NewInvoiceItem {
            product_id: Some(ProductId::new(product)),
            quantity,
            unit_price,
        }
    }

    fn single_item_invoice() -> Invoice {
        let input = NewInvoice {
            customer_id: Some(CustomerId::new(482_913)),
            items: vec![line(1, 2, money(1000))],
            paid_amount: None,
        };
        Invoice::create(InvoiceId::new(700_001), &input, test_time()).unwrap()
    }

    fn expect_invalid(result: DomainResult<Invoice>, reason: &str) {
        match result {
            Err(DomainError::InvalidInvoice(msg)) => assert_eq!(msg, reason),
            other => panic!("expected InvalidInvoice({reason}), got {other:?}"),
        }
    }

    #[test]
    fn create_computes_total_and_defaults_to_paid() {
        let invoice = single_item_invoice();

        assert_eq!(invoice.total_amount(), money(2000));
        assert_eq!(invoice.status(), InvoiceStatus::Paid);
        assert_eq!(invoice.paid_amount(), Decimal::ZERO);
        assert_eq!(invoice.created_at(), test_time());
    }

    #[test]
    fn items_point_back_at_their_invoice() {
        let invoice = single_item_invoice();
        assert!(invoice.items().iter().all(|i| i.invoice_id == InvoiceId::new(700_001)));
    }

    #[test]
    fn rejects_invoice_without_items() {
        let input = NewInvoice {
            customer_id: Some(CustomerId::new(1)),
            items: vec![],
            paid_amount: None,
        };
        expect_invalid(Invoice::create(InvoiceId::new(1), &input, test_time()), "no items");
    }

    #[test]
    fn empty_items_are_reported_before_missing_customer() {
        let input = NewInvoice::default();
        expect_invalid(Invoice::create(InvoiceId::new(1), &input, test_time()), "no items");
    }

    #[test]
    fn rejects_invoice_without_customer() {
        let input = NewInvoice {
            customer_id: None,
            items: vec![line(1, 1, money(100))],
            paid_amount: None,
        };
        expect_invalid(Invoice::create(InvoiceId::new(1), &input, test_time()), "no customer");
    }

    #[test]
    fn rejects_item_without_product() {
        let input = NewInvoice {
            customer_id: Some(CustomerId::new(1)),
            items: vec![
                line(1, 1, money(100)),
                NewInvoiceItem {
                    product_id: None,
                    quantity: 1,
                    unit_price: money(100),
                },
            ],
            paid_amount: None,
        };
        expect_invalid(
            Invoice::create(InvoiceId::new(1), &input, test_time()),
            "missing product id",
        );
    }

    #[test]
    fn rejects_zero_quantity_and_negative_price() {
        let zero_qty = NewInvoice {
            customer_id: Some(CustomerId::new(1)),
            items: vec![line(1, 0, money(100))],
            paid_amount: None,
        };
        expect_invalid(
            Invoice::create(InvoiceId::new(1), &zero_qty, test_time()),
            "quantity must be positive",
        );

        let negative = NewInvoice {
            customer_id: Some(CustomerId::new(1)),
            items: vec![line(1, 1, money(-100))],
            paid_amount: None,
        };
        expect_invalid(
            Invoice::create(InvoiceId::new(1), &negative, test_time()),
            "unit price must not be negative",
        );
    }

    #[test]
    fn rejects_paid_amount_above_total() {
        let input = NewInvoice {
            customer_id: Some(CustomerId::new(1)),
            items: vec![line(1, 1, money(100))],
            paid_amount: Some(money(101)),
        };
        expect_invalid(
            Invoice::create(InvoiceId::new(1), &input, test_time()),
            "paid amount exceeds invoice total",
        );
    }

    #[test]
    fn validate_matches_create_checks() {
        let input = NewInvoice {
            customer_id: Some(CustomerId::new(1)),
            items: vec![line(1, 3, money(250))],
            paid_amount: Some(money(750)),
        };
        assert!(input.validate().is_ok());

        let missing_customer = NewInvoice {
            customer_id: None,
            ..input
        };
        assert_eq!(
            missing_customer.validate(),
            Err(DomainError::invalid_invoice("no customer"))
        );
    }

    #[test]
    fn partial_payment_reduces_outstanding() {
        let mut invoice = single_item_invoice();
        invoice.register_payment(money(500)).unwrap();

        assert_eq!(invoice.paid_amount(), money(500));
        assert_eq!(invoice.outstanding_amount(), money(1500));
        assert!(invoice.is_outstanding());
        assert_eq!(invoice.status(), InvoiceStatus::Paid);
    }

    #[test]
    fn cannot_overpay_invoice() {
        let mut invoice = single_item_invoice();
        let err = invoice.register_payment(money(2001)).unwrap_err();
        assert_eq!(err, DomainError::invalid_invoice("cannot overpay invoice"));
        assert_eq!(invoice.paid_amount(), Decimal::ZERO);
    }

    #[test]
    fn cannot_pay_cancelled_invoice() {
        let mut invoice = single_item_invoice();
        invoice.set_status(InvoiceStatus::Cancelled);

        let err = invoice.register_payment(money(100)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInvoice(_)));
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("pending".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Pending);
        assert_eq!("Paid".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Paid);
        assert!("refunded".parse::<InvoiceStatus>().is_err());
        assert_eq!(serde_json::to_value(InvoiceStatus::Cancelled).unwrap(), "Cancelled");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn items_strategy() -> impl Strategy<Value = Vec<(u64, u32, i64)>> {
            prop::collection::vec((1u64..10_000, 1u32..1_000, 0i64..10_000_000), 1..20)
        }

        fn build(lines: &[(u64, u32, i64)]) -> Invoice {
            let input = NewInvoice {
                customer_id: Some(CustomerId::new(100_000)),
                items: lines
                    .iter()
                    .map(|&(p, q, c)| line(p, q, Decimal::new(c, 2)))
                    .collect(),
                paid_amount: None,
            };
            Invoice::create(InvoiceId::new(999_999), &input, test_time()).unwrap()
        }

        proptest! {
            /// Property: total equals the sum of quantity * unit price.
            #[test]
            fn total_is_sum_of_lines(lines in items_strategy()) {
                let invoice = build(&lines);
                let expected: Decimal = lines
                    .iter()
                    .map(|&(_, q, c)| Decimal::new(c, 2) * Decimal::from(q))
                    .sum();
                prop_assert_eq!(invoice.total_amount(), expected);
            }

            /// Property: total does not depend on item order and is stable across calls.
            #[test]
            fn total_is_order_independent(lines in items_strategy(), rotate in 0usize..20) {
                let forward = build(&lines);

                let mut reversed = lines.clone();
                reversed.reverse();
                let mut rotated = lines.clone();
                let k = rotate % rotated.len();
                rotated.rotate_left(k);

                prop_assert_eq!(forward.total_amount(), build(&reversed).total_amount());
                prop_assert_eq!(forward.total_amount(), build(&rotated).total_amount());
                prop_assert_eq!(forward.total_amount(), forward.total_amount());
            }
        }
    }
}
