//! Deployment address file written by the contract deploy script.
//!
//! ```json
//! {
//!   "voting": "CCVOTING...",
//!   "deployer": "GDEPLOYER...",
//!   "deploymentParams": { "regdays": 7, "votedays": 14, "maxvotes": 3 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{IndexerError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployments {
    /// Address of the voting contract.
    pub voting: String,
    #[serde(default)]
    pub deployer: Option<String>,
    #[serde(default)]
    pub deployment_params: Option<DeploymentParams>,
}

/// Parameters the contract was initialised with, in days / votes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentParams {
    pub regdays: u32,
    pub votedays: u32,
    pub maxvotes: u32,
}

impl Deployments {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let deployments: Deployments = serde_json::from_str(raw)?;
        if deployments.voting.trim().is_empty() {
            return Err(IndexerError::Config(
                "deployment file has an empty `voting` address".to_string(),
            ));
        }
        Ok(deployments)
    }

    pub fn describe_params(&self) -> String {
        match &self.deployment_params {
            Some(p) => format!(
                "{} registration days, {} voting days, {} votes per voter",
                p.regdays, p.votedays, p.maxvotes
            ),
            None => "parameters not recorded".to_string(),
        }
    }
}
