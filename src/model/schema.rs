//! The fixed order schema

use serde::{Deserialize, Serialize};

/// How a field's raw value is normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Free text, blanks become the empty string
    Text,
    /// Lenient number, unparsable values become zero
    Amount,
    /// Text that also drives publish ordering
    Date,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::Amount => write!(f, "amount"),
            FieldKind::Date => write!(f, "date"),
        }
    }
}

/// One column of the order schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Header text as it appears in exports and in the published sheet
    pub header: &'static str,
    /// Stable ASCII name
    pub ident: &'static str,
    pub kind: FieldKind,
}

const fn field(header: &'static str, ident: &'static str, kind: FieldKind) -> Field {
    Field {
        header,
        ident,
        kind,
    }
}

/// Number of fields in every order record
pub const FIELD_COUNT: usize = 22;

/// Field order is a compatibility contract with both the exports and the sheet.
pub const FIELDS: [Field; FIELD_COUNT] = [
    field("마켓아이디", "market_id", FieldKind::Text),
    field("마켓주문일자", "order_date", FieldKind::Date),
    field("마켓주문번호", "order_no", FieldKind::Text),
    field("마켓명", "market", FieldKind::Text),
    field("마켓상품명", "product_name", FieldKind::Text),
    field("결제수량", "quantity", FieldKind::Amount),
    field("수령인명", "recipient", FieldKind::Text),
    field("휴대폰번호", "phone", FieldKind::Text),
    field("배송주소", "address", FieldKind::Text),
    field("상세주소", "address_detail", FieldKind::Text),
    field("통관고유부호", "customs_code", FieldKind::Text),
    field("국내송장번호 택배사", "courier", FieldKind::Text),
    field("국내송장번호", "tracking_no", FieldKind::Text),
    field("구매사이트명", "purchase_site", FieldKind::Text),
    field("더망고주문상태", "order_status", FieldKind::Text),
    field("결제일자", "payment_date", FieldKind::Text),
    field("결제시간", "payment_time", FieldKind::Text),
    field("결제카드", "payment_card", FieldKind::Text),
    field("결제금액합계(원)", "payment_total", FieldKind::Amount),
    field("구매가격", "purchase_price", FieldKind::Amount),
    field("국제운송료", "shipping_fee", FieldKind::Amount),
    field("정산예정금액(원)", "settlement_amount", FieldKind::Amount),
];

/// Index of the order date field
pub const ORDER_DATE: usize = 1;
/// Index of the order number field
pub const ORDER_NO: usize = 2;
/// Index of the market name field
pub const MARKET: usize = 3;

/// Accessors over the fixed schema
pub struct Schema;

impl Schema {
    /// Header row, in schema order
    pub fn headers() -> Vec<String> {
        FIELDS.iter().map(|f| f.header.to_string()).collect()
    }

    /// Position of a field by its header text (whitespace-trimmed)
    pub fn index_of(header: &str) -> Option<usize> {
        let header = header.trim();
        FIELDS.iter().position(|f| f.header == header)
    }

    /// Whether the field at `index` is amount-typed
    pub fn is_amount(index: usize) -> bool {
        FIELDS
            .get(index)
            .map(|f| f.kind == FieldKind::Amount)
            .unwrap_or(false)
    }
}
