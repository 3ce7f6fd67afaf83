use crate::error::{HoldingError, Result};
use crate::handoff::{HandoffProcess, HandoffSide};
use crate::review::DraftReview;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// QuotasData (phase 8)
// ---------------------------------------------------------------------------

/// One quota-transfer engagement: a contract under partner review plus an
/// ITCD relay for the transfer tax. A project may run several transfers,
/// each independent of the others.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaTransfer {
    pub id: String,
    pub description: String,
    pub from_user_id: String,
    pub to_user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_percentage: Option<f64>,
    pub review: DraftReview,
    pub tax: HandoffProcess,
}

impl QuotaTransfer {
    /// `pending_guide`, `pending_payment`, `completed` or `exempt`.
    pub fn tax_status(&self) -> String {
        self.tax.status()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuotasData {
    #[serde(default)]
    pub transfers: Vec<QuotaTransfer>,
    #[serde(default)]
    pub transfer_seq: u32,
}

impl QuotasData {
    pub fn open_transfer(
        &mut self,
        description: impl Into<String>,
        from_user_id: impl Into<String>,
        to_user_id: impl Into<String>,
        quota_percentage: Option<f64>,
    ) -> String {
        self.transfer_seq += 1;
        let id = format!("QT{}", self.transfer_seq);
        self.transfers.push(QuotaTransfer {
            id: id.clone(),
            description: description.into(),
            from_user_id: from_user_id.into(),
            to_user_id: to_user_id.into(),
            quota_percentage,
            review: DraftReview::new(),
            tax: HandoffProcess::new(&[
                ("guide", HandoffSide::Staff),
                ("payment", HandoffSide::Client),
            ]),
        });
        id
    }

    pub fn transfer_mut(&mut self, id: &str) -> Result<&mut QuotaTransfer> {
        self.transfers
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| HoldingError::ProcessNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn transfers_are_independent() {
        let mut data = QuotasData::default();
        let t1 = data.open_transfer("Doação para herdeiro", "p1", "p3", Some(10.0));
        let t2 = data.open_transfer("Venda entre sócios", "p1", "p2", Some(5.0));
        assert_eq!(t1, "QT1");
        assert_eq!(t2, "QT2");

        data.transfer_mut(&t1).unwrap().review.submit_draft("doc-1", "cons-1").unwrap();
        let untouched = data.transfer_mut(&t2).unwrap();
        assert!(untouched.review.current_draft().is_none());
    }

    #[test]
    fn transfer_combines_review_and_tax_relay() {
        let mut data = QuotasData::default();
        let id = data.open_transfer("Doação", "p1", "p3", None);
        let transfer = data.transfer_mut(&id).unwrap();

        transfer.review.submit_draft("doc-1", "cons-1").unwrap();
        transfer.review.record_approval("p1").unwrap();
        assert!(transfer.review.finalize_if_approved(&["p1".to_string()]));

        assert_eq!(transfer.tax_status(), "pending_guide");
        transfer.tax.attach("guide", "cons-1", Role::Consultant, "d1").unwrap();
        transfer.tax.attach("payment", "cli-1", Role::Client, "d2").unwrap();
        assert_eq!(transfer.tax_status(), "completed");
    }

    #[test]
    fn exempt_tax_status() {
        let mut data = QuotasData::default();
        let id = data.open_transfer("Doação", "p1", "p3", None);
        let transfer = data.transfer_mut(&id).unwrap();
        transfer.tax.grant_exemption().unwrap();
        assert_eq!(transfer.tax_status(), "exempt");
    }

    #[test]
    fn unknown_transfer_errors() {
        let mut data = QuotasData::default();
        assert!(data.transfer_mut("QT9").is_err());
    }
}
