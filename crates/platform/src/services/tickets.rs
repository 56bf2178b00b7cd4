use chrono::Utc;
use tracing::info;

use ticketing_core::{
    CurrencyCode, DomainError, DomainResult, HasIdentity, Money, PurchaseId, ShowId, UserId,
};
use ticketing_events::{EventBus, PlatformEvent, TicketPurchased};

/// Ticket checkout for the finance module.
///
/// Totals are settled in a single platform currency; a unit price in any other
/// currency is rejected with [`DomainError::CurrencyMismatch`].
#[derive(Debug, Clone)]
pub struct TicketSales<B> {
    bus: B,
    settlement_currency: CurrencyCode,
}

impl<B> TicketSales<B>
where
    B: EventBus<PlatformEvent>,
{
    pub fn new(bus: B, settlement_currency: CurrencyCode) -> Self {
        Self {
            bus,
            settlement_currency,
        }
    }

    pub fn settlement_currency(&self) -> &CurrencyCode {
        &self.settlement_currency
    }

    /// Charge `unit_price × quantity` to `buyer` and publish [`TicketPurchased`].
    pub fn purchase<U>(
        &self,
        buyer: &U,
        show_id: ShowId,
        unit_price: &Money,
        quantity: u32,
    ) -> DomainResult<TicketPurchased>
    where
        U: HasIdentity<Id = UserId> + ?Sized,
    {
        if show_id.is_blank() {
            return Err(DomainError::invalid_id("ShowId: empty"));
        }
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if unit_price.is_negative() {
            return Err(DomainError::validation("unit price cannot be negative"));
        }

        let total = Money::zero(self.settlement_currency.clone())
            .add(&unit_price.multiply(i64::from(quantity))?)?;

        let purchase = TicketPurchased::new_at(
            PurchaseId::generate(),
            show_id,
            buyer.id().clone(),
            quantity,
            total,
            Utc::now(),
        );
        self.bus.publish(purchase.clone().into());

        info!(
            purchase_id = %purchase.purchase_id(),
            show_id = %purchase.show_id(),
            total = %purchase.total(),
            "tickets purchased"
        );
        Ok(purchase)
    }
}
