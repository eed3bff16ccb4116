pub mod cables;
pub mod conventions;
pub mod log;
pub mod ports;
pub mod vlans;

#[cfg(test)]
pub(crate) mod testing;

use chrono::Utc;
use uuid::Uuid;

use crate::config::ProvisionPolicy;
use crate::db::Store;
use crate::error::ProvisionError;
use crate::models::*;

use self::log::RunLog;

/// One provisioning invocation and its input
pub enum Operation<'r> {
    ConnectCables(&'r ConnectCablesRequest),
    CreateVlan(&'r CreateVlanRequest),
    SetVlanMembership(&'r SetVlanRequest),
}

impl Operation<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ConnectCables(_) => operation::CONNECT_CABLES,
            Operation::CreateVlan(_) => operation::CREATE_VLAN,
            Operation::SetVlanMembership(_) => operation::SET_VLAN_MEMBERSHIP,
        }
    }

    fn commit(&self) -> bool {
        match self {
            Operation::ConnectCables(req) => req.commit,
            Operation::CreateVlan(req) => req.commit,
            Operation::SetVlanMembership(req) => req.commit,
        }
    }
}

/// Provisioner runs each operation as a single transaction and keeps a
/// record of every run, failed ones included
#[derive(Clone)]
pub struct Provisioner {
    store: Store,
    policy: ProvisionPolicy,
}

impl Provisioner {
    pub fn new(store: Store, policy: ProvisionPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn run(&self, op: Operation<'_>) -> Result<ProvisionRun, ProvisionError> {
        let started_at = Utc::now();
        let mut log = RunLog::new(Uuid::new_v4().to_string(), op.name());
        tracing::info!(run_id = log.run_id(), operation = op.name(), "Provisioning run started");

        let mut tx = self.store.begin().await?;
        let result = match &op {
            Operation::ConnectCables(req) => cables::connect_cables(&mut tx, &self.policy, req, &mut log).await,
            Operation::CreateVlan(req) => vlans::create_vlan(&mut tx, &self.policy, req, &mut log).await,
            Operation::SetVlanMembership(req) => ports::set_vlan_membership(&mut tx, req, &mut log).await,
        };

        // The transaction must be closed before the run is recorded on
        // another connection.
        let (status, summary, error) = match result {
            Ok(summary) if op.commit() => {
                tx.commit().await?;
                (run_status::COMMITTED, summary, None)
            }
            Ok(summary) => {
                tx.rollback().await?;
                log.warning("dry run, all changes rolled back");
                (run_status::DRY_RUN, summary, None)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(run_id = log.run_id(), "Rollback failed: {}", rollback_err);
                }
                log.failure(e.to_string());
                (run_status::FAILED, String::new(), Some(e))
            }
        };

        let run = ProvisionRun {
            id: log.run_id().to_string(),
            operation: op.name().to_string(),
            status: status.to_string(),
            summary,
            error: error.as_ref().map(|e| e.to_string()),
            log: log.into_entries(),
            started_at,
            finished_at: Utc::now(),
        };
        if let Err(e) = self.store.record_run(&run).await {
            tracing::warn!(run_id = run.id.as_str(), "Failed to record provisioning run: {}", e);
        }

        match error {
            Some(e) => Err(e),
            None => Ok(run),
        }
    }
}
