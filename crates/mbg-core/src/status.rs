//! # Document Lifecycles
//!
//! ```text
//! Purchase order:  DRAFT ──► SUBMITTED ──► PARTIALLY_RECEIVED ──► RECEIVED
//!                    │           │                ▲      │
//!                    └───────────┴──► CANCELLED   └──────┘
//!
//! Work order:      PLANNED ──► IN_PROGRESS ──► COMPLETED
//!                    │             │
//!                    └─────────────┴──► CANCELLED
//!
//! Delivery order:  PENDING ──► DISPATCHED ──► DELIVERED
//!                    │
//!                    └──► CANCELLED
//! ```
//!
//! Each `check_*` function returns `InvalidStatusTransition` for an edge
//! that is not drawn above.

use crate::error::{CoreError, CoreResult};
use crate::types::{DeliveryOrderStatus, PurchaseOrderStatus, WorkOrderStatus};

impl PurchaseOrderStatus {
    pub fn can_transition_to(self, to: PurchaseOrderStatus) -> bool {
        use PurchaseOrderStatus::*;
        matches!(
            (self, to),
            (Draft, Submitted)
                | (Submitted, PartiallyReceived)
                | (Submitted, Received)
                | (PartiallyReceived, PartiallyReceived)
                | (PartiallyReceived, Received)
                | (Draft, Cancelled)
                | (Submitted, Cancelled)
        )
    }

    /// Lines and header may only change before submission.
    pub fn is_editable(self) -> bool {
        self == PurchaseOrderStatus::Draft
    }

    /// Goods may be received against this order.
    pub fn accepts_receipts(self) -> bool {
        matches!(
            self,
            PurchaseOrderStatus::Submitted | PurchaseOrderStatus::PartiallyReceived
        )
    }

    /// Status implied by line totals after a receipt.
    pub fn after_receipt(fully_received: bool) -> PurchaseOrderStatus {
        if fully_received {
            PurchaseOrderStatus::Received
        } else {
            PurchaseOrderStatus::PartiallyReceived
        }
    }
}

impl WorkOrderStatus {
    pub fn can_transition_to(self, to: WorkOrderStatus) -> bool {
        use WorkOrderStatus::*;
        matches!(
            (self, to),
            (Planned, InProgress)
                | (InProgress, Completed)
                | (Planned, Cancelled)
                | (InProgress, Cancelled)
        )
    }
}

impl DeliveryOrderStatus {
    pub fn can_transition_to(self, to: DeliveryOrderStatus) -> bool {
        use DeliveryOrderStatus::*;
        matches!(
            (self, to),
            (Pending, Dispatched) | (Dispatched, Delivered) | (Pending, Cancelled)
        )
    }
}

pub fn check_purchase_order(
    number: &str,
    from: PurchaseOrderStatus,
    to: PurchaseOrderStatus,
) -> CoreResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::transition("Purchase order", number, from, to))
    }
}

pub fn check_work_order(number: &str, from: WorkOrderStatus, to: WorkOrderStatus) -> CoreResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::transition("Work order", number, from, to))
    }
}

pub fn check_delivery_order(
    number: &str,
    from: DeliveryOrderStatus,
    to: DeliveryOrderStatus,
) -> CoreResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::transition("Delivery order", number, from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purchase_order_flow() {
        use PurchaseOrderStatus::*;
        assert!(check_purchase_order("PO-1", Draft, Submitted).is_ok());
        assert!(check_purchase_order("PO-1", Submitted, PartiallyReceived).is_ok());
        assert!(check_purchase_order("PO-1", PartiallyReceived, Received).is_ok());
        assert!(check_purchase_order("PO-1", Submitted, Cancelled).is_ok());

        assert!(check_purchase_order("PO-1", Draft, Received).is_err());
        assert!(check_purchase_order("PO-1", PartiallyReceived, Cancelled).is_err());
        assert!(check_purchase_order("PO-1", Received, Cancelled).is_err());
        assert!(check_purchase_order("PO-1", Cancelled, Submitted).is_err());
    }

    #[test]
    fn test_work_order_flow() {
        use WorkOrderStatus::*;
        assert!(check_work_order("WO-1", Planned, InProgress).is_ok());
        assert!(check_work_order("WO-1", InProgress, Completed).is_ok());
        assert!(check_work_order("WO-1", InProgress, Cancelled).is_ok());

        let err = check_work_order("WO-1", Planned, Completed).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Work order WO-1 is PLANNED, cannot move to COMPLETED"
        );
        assert!(check_work_order("WO-1", Completed, Cancelled).is_err());
    }

    #[test]
    fn test_delivery_order_flow() {
        use DeliveryOrderStatus::*;
        assert!(check_delivery_order("DO-1", Pending, Dispatched).is_ok());
        assert!(check_delivery_order("DO-1", Dispatched, Delivered).is_ok());
        assert!(check_delivery_order("DO-1", Pending, Cancelled).is_ok());
        assert!(check_delivery_order("DO-1", Dispatched, Cancelled).is_err());
        assert!(check_delivery_order("DO-1", Pending, Delivered).is_err());
    }

    #[test]
    fn test_po_helpers() {
        assert!(PurchaseOrderStatus::Draft.is_editable());
        assert!(!PurchaseOrderStatus::Submitted.is_editable());
        assert!(PurchaseOrderStatus::PartiallyReceived.accepts_receipts());
        assert!(!PurchaseOrderStatus::Draft.accepts_receipts());
        assert_eq!(
            PurchaseOrderStatus::after_receipt(false),
            PurchaseOrderStatus::PartiallyReceived
        );
    }
}
