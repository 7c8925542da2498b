use rust_decimal::Decimal;

use crate::models::{Booking, Locale, PaymentMethod};

pub fn is_eligible(method: &PaymentMethod, total: Decimal) -> bool {
    total >= method.rule_min && (!method.has_upper_bound() || total <= method.rule_max)
}

/// The violated bound for `total`, minimum first. `None` when eligible.
pub fn eligibility_message(method: &PaymentMethod, total: Decimal, locale: Locale) -> Option<String> {
    if total < method.rule_min {
        return Some(match locale {
            Locale::En => format!(
                "Minimum order amount for this payment method is {} {}",
                method.rule_min, method.currency
            ),
            Locale::Vi => format!(
                "Giá trị đơn hàng tối thiểu cho phương thức này là {} {}",
                method.rule_min, method.currency
            ),
        });
    }

    if method.has_upper_bound() && total > method.rule_max {
        return Some(match locale {
            Locale::En => format!(
                "Maximum order amount for this payment method is {} {}",
                method.rule_max, method.currency
            ),
            Locale::Vi => format!(
                "Giá trị đơn hàng tối đa cho phương thức này là {} {}",
                method.rule_max, method.currency
            ),
        });
    }

    None
}

/// First eligible method in caller order.
pub fn default_method(methods: &[PaymentMethod], total: Decimal) -> Option<i64> {
    methods
        .iter()
        .find(|m| is_eligible(m, total))
        .map(|m| m.id)
}

pub fn checkout_notice(method: &PaymentMethod, locale: Locale) -> Option<String> {
    match method.provider.as_str() {
        "vnpay" => Some(
            match locale {
                Locale::En => "You will be redirected to VNPay to complete the payment. Please do not close the browser until the transaction finishes.",
                Locale::Vi => "Bạn sẽ được chuyển đến VNPay để hoàn tất thanh toán. Vui lòng không đóng trình duyệt cho đến khi giao dịch kết thúc.",
            }
            .to_string(),
        ),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckoutError {
    #[error("no payment method selected")]
    NoMethodSelected,

    #[error("payment method {0} is not available")]
    UnknownMethod(i64),

    #[error("{0}")]
    NotEligible(String),

    #[error("card details must be saved before paying by credit card")]
    CardNotSaved,
}

/// Per-booking payment selection during checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkout {
    pub selected_method_id: Option<i64>,
    pub card_saved: bool,
    credit_card_method_id: i64,
}

impl Checkout {
    pub fn for_booking(booking: &Booking, credit_card_method_id: i64) -> Self {
        Self {
            selected_method_id: booking.payment_method_id,
            card_saved: booking.has_saved_card,
            credit_card_method_id,
        }
    }

    pub fn select(&mut self, method_id: i64) {
        self.selected_method_id = (method_id != 0).then_some(method_id);
    }

    pub fn mark_card_saved(&mut self) {
        self.card_saved = true;
    }

    pub fn is_credit_card(&self, method_id: i64) -> bool {
        method_id == self.credit_card_method_id
    }

    pub fn validate<'a>(
        &self,
        methods: &'a [PaymentMethod],
        total: Decimal,
        locale: Locale,
    ) -> Result<&'a PaymentMethod, CheckoutError> {
        let id = self.selected_method_id.ok_or(CheckoutError::NoMethodSelected)?;
        let method = methods
            .iter()
            .find(|m| m.id == id)
            .ok_or(CheckoutError::UnknownMethod(id))?;

        if let Some(message) = eligibility_message(method, total, locale) {
            return Err(CheckoutError::NotEligible(message));
        }
        if self.is_credit_card(id) && !self.card_saved {
            return Err(CheckoutError::CardNotSaved);
        }

        Ok(method)
    }
}
