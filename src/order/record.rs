use serde::Serialize;

/// Number of columns written per order row.
pub const COLUMN_COUNT: usize = 13;

/// Sheet header labels, in column order.
pub const COLUMN_LABELS: [&str; COLUMN_COUNT] = [
    "注文ID",
    "ストア名",
    "宛先メールアドレス",
    "メールタイトル",
    "注文日",
    "商品の合計金額",
    "クーポン利用",
    "送料",
    "商品券利用",
    "支払方法",
    "PayPay残高等利用額",
    "クレジットカード利用額",
    "商品名",
];

/// Field names, in the same order as `COLUMN_LABELS`.
pub const FIELD_NAMES: [&str; COLUMN_COUNT] = [
    "order_id",
    "store_name",
    "recipient_email",
    "subject",
    "order_date",
    "item_total",
    "coupon_used",
    "shipping_fee",
    "gift_card_used",
    "payment_method",
    "paypay_balance_used",
    "credit_card_amount",
    "item_name",
];

/// One order extracted from a confirmation or cancellation email.
///
/// Every field is always present; a field whose pattern did not match holds
/// an empty string. Amounts are plain digit strings without sign, separator
/// or unit (deducted amounts are stored as positive magnitudes).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub store_name: String,
    pub recipient_email: String,
    pub subject: String,
    /// `YYYY/MM/DD`
    pub order_date: String,
    pub item_total: String,
    pub coupon_used: String,
    pub shipping_fee: String,
    pub gift_card_used: String,
    pub payment_method: String,
    pub paypay_balance_used: String,
    pub credit_card_amount: String,
    pub item_name: String,
}

impl OrderRecord {
    /// Values in sheet column order.
    pub fn to_row(&self) -> [&str; COLUMN_COUNT] {
        [
            self.order_id.as_str(),
            self.store_name.as_str(),
            self.recipient_email.as_str(),
            self.subject.as_str(),
            self.order_date.as_str(),
            self.item_total.as_str(),
            self.coupon_used.as_str(),
            self.shipping_fee.as_str(),
            self.gift_card_used.as_str(),
            self.payment_method.as_str(),
            self.paypay_balance_used.as_str(),
            self.credit_card_amount.as_str(),
            self.item_name.as_str(),
        ]
    }

    /// `(field name, value)` pairs in column order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        FIELD_NAMES.into_iter().zip(self.to_row())
    }

    /// Ordering key for a batch: order date, then order id, both compared as strings.
    pub fn sort_key(&self) -> (&str, &str) {
        (self.order_date.as_str(), self.order_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record_has_every_field_empty() {
        let record = OrderRecord::default();
        let fields: Vec<_> = record.fields().collect();

        assert_eq!(fields.len(), COLUMN_COUNT);
        assert!(fields.iter().all(|(_, value)| value.is_empty()));
    }

    #[test]
    fn test_row_follows_column_order() {
        let record = OrderRecord {
            order_id: "store-1".to_string(),
            order_date: "2024/01/01".to_string(),
            item_name: "テスト商品".to_string(),
            ..Default::default()
        };
        let row = record.to_row();

        assert_eq!(row[0], "store-1");
        assert_eq!(row[4], "2024/01/01");
        assert_eq!(row[12], "テスト商品");
    }

    #[test]
    fn test_serialized_keys_match_field_names() {
        let value = serde_json::to_value(OrderRecord::default()).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), COLUMN_COUNT);
        for name in FIELD_NAMES {
            assert!(object.contains_key(name), "missing key {}", name);
        }
    }
}
