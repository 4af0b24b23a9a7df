use std::sync::OnceLock;

use chrono::NaiveDateTime;
use log::debug;
use regex::Regex;

use super::error::ParseError;
use super::record::OrderRecord;

/// Date-time layout used on the "注文日時" line.
const ORDER_DATE_INPUT_FORMAT: &str = "%Y年%m月%d日 %H時%M分%S秒";
const ORDER_DATE_OUTPUT_FORMAT: &str = "%Y/%m/%d";
// chrono reads the space in the format as "zero or more", so the separator is
// checked here first.
const ORDER_DATE_LAYOUT: &str = r"^[0-9]{4}年[0-9]{1,2}月[0-9]{1,2}日\s+[0-9]{1,2}時[0-9]{1,2}分[0-9]{1,2}秒$";

/// Fields read from the email body. Recipient and subject come from headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyField {
    OrderId,
    StoreName,
    OrderDate,
    ItemTotal,
    CouponUsed,
    ShippingFee,
    GiftCardUsed,
    PaymentMethod,
    PaypayBalanceUsed,
    CreditCardAmount,
    ItemName,
}

impl BodyField {
    fn is_amount(self) -> bool {
        matches!(
            self,
            BodyField::ItemTotal
                | BodyField::CouponUsed
                | BodyField::ShippingFee
                | BodyField::GiftCardUsed
                | BodyField::PaypayBalanceUsed
                | BodyField::CreditCardAmount
        )
    }

    fn slot(self, record: &mut OrderRecord) -> &mut String {
        match self {
            BodyField::OrderId => &mut record.order_id,
            BodyField::StoreName => &mut record.store_name,
            BodyField::OrderDate => &mut record.order_date,
            BodyField::ItemTotal => &mut record.item_total,
            BodyField::CouponUsed => &mut record.coupon_used,
            BodyField::ShippingFee => &mut record.shipping_fee,
            BodyField::GiftCardUsed => &mut record.gift_card_used,
            BodyField::PaymentMethod => &mut record.payment_method,
            BodyField::PaypayBalanceUsed => &mut record.paypay_balance_used,
            BodyField::CreditCardAmount => &mut record.credit_card_amount,
            BodyField::ItemName => &mut record.item_name,
        }
    }
}

// Line captures stop at CR as well as LF so CRLF bodies give the same values.
// `\s` is Unicode-aware and covers the full-width spaces used for alignment.
const PATTERNS: [(BodyField, &str); 11] = [
    (BodyField::OrderId, r"注文ID\s*：([^\r\n]+)"),
    (BodyField::StoreName, r"ストア名：([^\r\n]+)"),
    (BodyField::OrderDate, r"注文日時：([^\r\n]+)"),
    (BodyField::ItemTotal, r"商品の合計金額：\s*([\d,]+)円"),
    (BodyField::CouponUsed, r"クーポン利用：\s*-([\d,]+)円"),
    (BodyField::ShippingFee, r"送料：\s*([\d,]+)円"),
    (BodyField::GiftCardUsed, r"商品券利用：\s*-([\d,]+)円"),
    (BodyField::PaymentMethod, r"支払方法\s*：([^\r\n]+)"),
    (BodyField::PaypayBalanceUsed, r"PayPay残高等利用額：\s*-([\d,]+)円"),
    (BodyField::CreditCardAmount, r"\n合計金額：\s*([\d,]+)円"),
    (BodyField::ItemName, r"（1）([^\r\n]+)\r?\n"),
];

fn compiled_patterns() -> Result<&'static [(BodyField, Regex)], ParseError> {
    static COMPILED: OnceLock<Result<Vec<(BodyField, Regex)>, regex::Error>> = OnceLock::new();
    COMPILED
        .get_or_init(|| {
            PATTERNS
                .iter()
                .map(|(field, pattern)| Regex::new(pattern).map(|re| (*field, re)))
                .collect()
        })
        .as_deref()
        .map_err(|e| ParseError::Pattern(e.clone()))
}

fn order_date_layout() -> Result<&'static Regex, ParseError> {
    static LAYOUT: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    LAYOUT
        .get_or_init(|| Regex::new(ORDER_DATE_LAYOUT))
        .as_ref()
        .map_err(|e| ParseError::Pattern(e.clone()))
}

/// Extract the order fields from an email body.
///
/// Each field takes the first match of its pattern; unmatched fields stay
/// empty. Recipient and subject are left empty for the caller to fill in.
/// A non-empty order date that is not in the expected layout is an error.
pub fn parse_body(body: &str) -> Result<OrderRecord, ParseError> {
    debug!("Parsing order body ({} bytes)", body.len());

    let mut record = OrderRecord::default();

    for (field, re) in compiled_patterns()? {
        let Some(captured) = re.captures(body).and_then(|caps| caps.get(1)) else {
            debug!("No match for {:?}", field);
            continue;
        };

        let value = if field.is_amount() {
            normalize_amount(captured.as_str())
        } else {
            captured.as_str().to_string()
        };
        *field.slot(&mut record) = value;
    }

    if !record.order_date.is_empty() {
        record.order_date = reformat_order_date(&record.order_date)?;
    }

    Ok(record)
}

/// Strip the yen unit and thousands separators: `"1,234円"` -> `"1234"`.
pub fn normalize_amount(raw: &str) -> String {
    raw.replace(['円', ','], "")
}

/// `"2024年03月05日 10時20分30秒"` -> `"2024/03/05"`. The time of day is dropped.
pub fn reformat_order_date(raw: &str) -> Result<String, ParseError> {
    let invalid = || ParseError::OrderDate { value: raw.to_string() };

    if !order_date_layout()?.is_match(raw) {
        return Err(invalid());
    }

    let parsed = NaiveDateTime::parse_from_str(raw, ORDER_DATE_INPUT_FORMAT).map_err(|_| invalid())?;

    Ok(parsed.format(ORDER_DATE_OUTPUT_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "\
ご注文ありがとうございます。

注文ID　　：shop-10000123
ストア名：サンプルストア
注文日時：2024年03月05日 10時20分30秒

（1）テスト商品 ブラック
  数量：1

商品の合計金額：　12,980円
クーポン利用：　-1,234円
送料：　　650円
商品券利用：　-1,000円
PayPay残高等利用額：　-396円

合計金額：　11,000円

支払方法　：クレジットカード決済
";

    #[test]
    fn test_every_pattern_compiles() {
        assert_eq!(compiled_patterns().unwrap().len(), PATTERNS.len());
        assert!(order_date_layout().is_ok());
    }

    #[test]
    fn test_parse_full_body() {
        let record = parse_body(BODY).unwrap();

        assert_eq!(record.order_id, "shop-10000123");
        assert_eq!(record.store_name, "サンプルストア");
        assert_eq!(record.order_date, "2024/03/05");
        assert_eq!(record.item_total, "12980");
        assert_eq!(record.coupon_used, "1234");
        assert_eq!(record.shipping_fee, "650");
        assert_eq!(record.gift_card_used, "1000");
        assert_eq!(record.payment_method, "クレジットカード決済");
        assert_eq!(record.paypay_balance_used, "396");
        assert_eq!(record.credit_card_amount, "11000");
        assert_eq!(record.item_name, "テスト商品 ブラック");
        assert_eq!(record.recipient_email, "");
        assert_eq!(record.subject, "");
    }

    #[test]
    fn test_coupon_is_stored_without_sign_separator_or_unit() {
        let record = parse_body("クーポン利用：　-1,234円").unwrap();
        assert_eq!(record.coupon_used, "1234");
    }

    #[test]
    fn test_credit_card_amount_needs_line_start() {
        // "商品の合計金額" must not be taken for the grand total.
        let record = parse_body("商品の合計金額：　500円\n").unwrap();
        assert_eq!(record.item_total, "500");
        assert_eq!(record.credit_card_amount, "");
    }

    #[test]
    fn test_item_name_needs_trailing_newline() {
        assert_eq!(parse_body("（1）商品A").unwrap().item_name, "");
        assert_eq!(parse_body("（1）商品A\n（2）商品B\n").unwrap().item_name, "商品A");
    }

    #[test]
    fn test_crlf_body() {
        let body = BODY.replace('\n', "\r\n");
        let record = parse_body(&body).unwrap();

        assert_eq!(record.order_id, "shop-10000123");
        assert_eq!(record.order_date, "2024/03/05");
        assert_eq!(record.item_name, "テスト商品 ブラック");
        assert_eq!(record.credit_card_amount, "11000");
    }

    #[test]
    fn test_unmatched_body_gives_empty_record() {
        let record = parse_body("関係のないメールです。").unwrap();
        assert_eq!(record, OrderRecord::default());
    }

    #[test]
    fn test_reformat_order_date() {
        assert_eq!(reformat_order_date("2024年03月05日 10時20分30秒").unwrap(), "2024/03/05");
    }

    #[test]
    fn test_order_date_needs_separator_between_date_and_time() {
        let err = reformat_order_date("2024年03月05日10時20分30秒").unwrap_err();
        assert!(matches!(err, ParseError::OrderDate { value } if value == "2024年03月05日10時20分30秒"));

        assert!(reformat_order_date("2024年03月05日 10時20分30秒 ").is_err());
        assert_eq!(reformat_order_date("2024年3月5日 10時20分30秒").unwrap(), "2024/03/05");
    }

    #[test]
    fn test_bad_order_date_is_an_error() {
        let err = parse_body("注文日時：2024/03/05 10:20\n").unwrap_err();
        match err {
            ParseError::OrderDate { value, .. } => assert_eq!(value, "2024/03/05 10:20"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_normalize_amount() {
        assert_eq!(normalize_amount("1,234,567円"), "1234567");
        assert_eq!(normalize_amount("0"), "0");
    }
}
