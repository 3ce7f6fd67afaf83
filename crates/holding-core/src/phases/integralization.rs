use crate::error::{HoldingError, Result};
use crate::phases::SubmissionStatus;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// IntegralizationData (phase 3)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    RealEstate,
    Vehicle,
    Financial,
    Cash,
    Other,
}

/// One asset to be contributed into the company's capital. Real-estate
/// assets later drive one ITBI and one registration sub-process each.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub description: String,
    pub kind: AssetKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_value: Option<String>,
    /// Registry or plate number, where the asset class has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegralizationData {
    #[serde(default)]
    pub status: SubmissionStatus,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub asset_seq: u32,
}

impl IntegralizationData {
    pub fn add_asset(
        &mut self,
        description: impl Into<String>,
        kind: AssetKind,
        declared_value: Option<String>,
        registration: Option<String>,
    ) -> Result<String> {
        self.ensure_pending_client("add an asset")?;
        self.asset_seq += 1;
        let id = format!("A{}", self.asset_seq);
        self.assets.push(Asset {
            id: id.clone(),
            description: description.into(),
            kind,
            declared_value,
            registration,
        });
        Ok(id)
    }

    pub fn remove_asset(&mut self, asset_id: &str) -> Result<()> {
        self.ensure_pending_client("remove an asset")?;
        let before = self.assets.len();
        self.assets.retain(|a| a.id != asset_id);
        if self.assets.len() == before {
            return Err(HoldingError::AssetNotFound(asset_id.to_string()));
        }
        Ok(())
    }

    /// Send the asset list for consultant review. Requires at least one
    /// asset; only reachable from the client-editing state, so a duplicate
    /// submit is rejected rather than double-applied.
    pub fn submit(&mut self) -> Result<()> {
        self.ensure_pending_client("submit the asset list")?;
        if self.assets.is_empty() {
            return Err(HoldingError::InvalidTransition {
                from: self.status.to_string(),
                to: SubmissionStatus::PendingConsultantReview.to_string(),
                reason: "at least one asset is required".to_string(),
            });
        }
        self.status = SubmissionStatus::PendingConsultantReview;
        Ok(())
    }

    pub fn approve(&mut self) -> Result<()> {
        if self.status != SubmissionStatus::PendingConsultantReview {
            return Err(HoldingError::InvalidTransition {
                from: self.status.to_string(),
                to: SubmissionStatus::Approved.to_string(),
                reason: "asset list is not under consultant review".to_string(),
            });
        }
        self.status = SubmissionStatus::Approved;
        Ok(())
    }

    /// Assets that drive the ITBI and registration phases.
    pub fn real_estate_assets(&self) -> Vec<&Asset> {
        self.assets
            .iter()
            .filter(|a| a.kind == AssetKind::RealEstate)
            .collect()
    }

    fn ensure_pending_client(&self, what: &str) -> Result<()> {
        if self.status != SubmissionStatus::PendingClient {
            return Err(HoldingError::InvalidTransition {
                from: self.status.to_string(),
                to: self.status.to_string(),
                reason: format!("can only {what} while pending with the client"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_one_asset() -> IntegralizationData {
        let mut data = IntegralizationData::default();
        data.add_asset("Apartamento centro", AssetKind::RealEstate, None, Some("M-12345".into()))
            .unwrap();
        data
    }

    #[test]
    fn submit_requires_an_asset() {
        let mut data = IntegralizationData::default();
        assert!(data.submit().is_err());
        assert_eq!(data.status, SubmissionStatus::PendingClient);
    }

    #[test]
    fn submit_is_rejected_when_already_in_review() {
        let mut data = with_one_asset();
        data.submit().unwrap();
        assert!(data.submit().is_err());
        assert_eq!(data.status, SubmissionStatus::PendingConsultantReview);
    }

    #[test]
    fn assets_frozen_after_submit() {
        let mut data = with_one_asset();
        data.submit().unwrap();
        assert!(data.add_asset("Carro", AssetKind::Vehicle, None, None).is_err());
        assert!(data.remove_asset("A1").is_err());
    }

    #[test]
    fn remove_unknown_asset_errors() {
        let mut data = with_one_asset();
        assert!(data.remove_asset("A99").is_err());
        assert_eq!(data.assets.len(), 1);
    }

    #[test]
    fn real_estate_filter() {
        let mut data = with_one_asset();
        data.add_asset("Carro", AssetKind::Vehicle, None, None).unwrap();
        data.add_asset("Sala comercial", AssetKind::RealEstate, None, None).unwrap();
        assert_eq!(data.real_estate_assets().len(), 2);
    }

    #[test]
    fn approval_path() {
        let mut data = with_one_asset();
        data.submit().unwrap();
        data.approve().unwrap();
        assert_eq!(data.status, SubmissionStatus::Approved);
    }
}
