use log::*;
use widget_payment_engine::{checkout_objects::Receipt, helpers::ReceiptSealer};

use crate::errors::ServerError;

/// Seals receipts into links on the way out of a checkout, and opens them again for the receipt page.
#[derive(Debug, Clone)]
pub struct ReceiptIssuer {
    sealer: ReceiptSealer,
    max_age_minutes: i64,
}

impl ReceiptIssuer {
    pub fn new(sealer: ReceiptSealer, max_age_minutes: i64) -> Self {
        Self { sealer, max_age_minutes }
    }

    /// A link to the receipt page, or `None` if one could not be made. The order has been recorded either way, so a
    /// failure here is logged rather than reported to the buyer.
    pub fn issue(&self, receipt: &Receipt) -> Option<String> {
        self.sealer
            .seal(receipt)
            .map_err(|e| error!("💻️ Could not seal the receipt for order #{}. {e}", receipt.order_id))
            .ok()
    }

    pub fn open(&self, link: &str) -> Result<Receipt, ServerError> {
        self.sealer.open(link, self.max_age_minutes).map_err(|e| {
            debug!("💻️ Receipt link rejected. {e}");
            ServerError::InvalidLink
        })
    }
}
