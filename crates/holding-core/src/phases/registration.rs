use crate::error::{HoldingError, Result};
use crate::handoff::{HandoffProcess, HandoffSide};
use crate::phases::integralization::Asset;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RegistrationData (phase 6)
// ---------------------------------------------------------------------------

/// Property registration at the registry office: staff attach the fee guide,
/// the client pays, staff attach the updated registry certificate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationProcess {
    pub id: String,
    pub asset_id: String,
    pub asset_description: String,
    pub relay: HandoffProcess,
}

impl RegistrationProcess {
    pub fn new(asset: &Asset) -> Self {
        Self {
            id: format!("reg-{}", asset.id),
            asset_id: asset.id.clone(),
            asset_description: asset.description.clone(),
            relay: HandoffProcess::new(&[
                ("fee_guide", HandoffSide::Staff),
                ("fee_payment", HandoffSide::Client),
                ("registration", HandoffSide::Staff),
            ]),
        }
    }

    pub fn status(&self) -> String {
        self.relay.status()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationData {
    #[serde(default)]
    pub processes: Vec<RegistrationProcess>,
}

impl RegistrationData {
    /// One sub-process per real-estate asset, idempotent per asset id.
    pub fn seed_from_assets(&mut self, assets: &[&Asset]) {
        for asset in assets {
            if !self.processes.iter().any(|p| p.asset_id == asset.id) {
                self.processes.push(RegistrationProcess::new(asset));
            }
        }
    }

    pub fn process_mut(&mut self, id: &str) -> Result<&mut RegistrationProcess> {
        self.processes
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| HoldingError::ProcessNotFound(id.to_string()))
    }

    pub fn all_registered(&self) -> bool {
        self.processes.iter().all(|p| p.relay.is_complete())
    }
}
