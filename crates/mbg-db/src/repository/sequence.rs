//! # Document Numbers
//!
//! Human-readable numbers for documents, unique per prefix and day:
//!
//! ```text
//! PO-20260301-0001   purchase order
//! GR-20260301-0001   goods receipt
//! WO-20260301-0007   work order
//! DO-20260302-0001   delivery order
//! ```
//!
//! Counters live in `document_sequences` and only ever increase, so a
//! deleted draft never causes its number to be handed out twice.

use chrono::NaiveDate;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;

/// Document kinds that carry a generated number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PurchaseOrder,
    GoodsReceipt,
    WorkOrder,
    DeliveryOrder,
}

impl DocumentKind {
    pub const fn prefix(self) -> &'static str {
        match self {
            DocumentKind::PurchaseOrder => "PO",
            DocumentKind::GoodsReceipt => "GR",
            DocumentKind::WorkOrder => "WO",
            DocumentKind::DeliveryOrder => "DO",
        }
    }
}

/// Formats `{PREFIX}-{YYYYMMDD}-{NNNN}`.
pub fn format_number(kind: DocumentKind, day: NaiveDate, sequence: i64) -> String {
    format!("{}-{}-{:04}", kind.prefix(), day.format("%Y%m%d"), sequence)
}

/// Allocates the next number for `kind` on `day`.
///
/// Must run inside the transaction that inserts the document.
pub(crate) async fn next_number(
    conn: &mut SqliteConnection,
    kind: DocumentKind,
    day: NaiveDate,
) -> DbResult<String> {
    let day_key = day.format("%Y%m%d").to_string();

    let sequence: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO document_sequences (prefix, day, last_value)
        VALUES (?1, ?2, 1)
        ON CONFLICT (prefix, day) DO UPDATE SET last_value = last_value + 1
        RETURNING last_value
        "#,
    )
    .bind(kind.prefix())
    .bind(&day_key)
    .fetch_one(&mut *conn)
    .await?;

    let number = format_number(kind, day, sequence);
    debug!(number = %number, "Allocated document number");
    Ok(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{date, db};

    #[test]
    fn test_format_number() {
        assert_eq!(
            format_number(DocumentKind::WorkOrder, date(2026, 3, 1), 7),
            "WO-20260301-0007"
        );
    }

    #[tokio::test]
    async fn test_numbers_increment_per_prefix_and_day() {
        let db = db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let day = date(2026, 3, 1);

        let a = next_number(&mut conn, DocumentKind::PurchaseOrder, day).await.unwrap();
        let b = next_number(&mut conn, DocumentKind::PurchaseOrder, day).await.unwrap();
        let c = next_number(&mut conn, DocumentKind::DeliveryOrder, day).await.unwrap();
        let d = next_number(&mut conn, DocumentKind::PurchaseOrder, date(2026, 3, 2))
            .await
            .unwrap();

        assert_eq!(a, "PO-20260301-0001");
        assert_eq!(b, "PO-20260301-0002");
        assert_eq!(c, "DO-20260301-0001");
        assert_eq!(d, "PO-20260302-0001");
    }
}
