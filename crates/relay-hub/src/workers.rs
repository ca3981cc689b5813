//! Worker registry. A worker is bound to one manager for life.

use relay_ledger::{CallContext, Tx};
use relay_types::{Address, RelayError, RelayEvent, Result, WorkerEntry};
use tracing::info;

use crate::stake::is_staked;
use crate::RelayHub;

impl RelayHub {
	/// Binds `workers` to the calling manager.
	pub fn add_relay_workers(
		&self,
		tx: &mut Tx<'_>,
		ctx: &CallContext,
		workers: &[Address],
	) -> Result<()> {
		let manager = ctx.caller;
		let state = tx.world_mut().hub_mut(&self.address())?;
		if !is_staked(state, &manager) {
			return Err(RelayError::NotStaked);
		}

		let count = state.worker_counts.get(&manager).copied().unwrap_or_default();
		let workers_count = count.saturating_add(workers.len() as u64);
		if workers_count > state.params.max_worker_count {
			return Err(RelayError::TooManyWorkers);
		}
		for worker in workers {
			if state.workers.contains_key(worker) {
				return Err(RelayError::WorkerAlreadyBound);
			}
			state.workers.insert(
				*worker,
				WorkerEntry {
					manager,
					enabled: true,
				},
			);
		}
		state.worker_counts.insert(manager, workers_count);

		tx.emit(
			self.address(),
			RelayEvent::RelayWorkersAdded {
				relay_manager: manager,
				new_relay_workers: workers.to_vec(),
				workers_count,
			},
		);
		info!(manager = %manager, added = workers.len(), workers_count, "Relay workers added");
		Ok(())
	}

	/// Disables workers of the calling manager. Their binding is kept.
	pub fn disable_relay_workers(
		&self,
		tx: &mut Tx<'_>,
		ctx: &CallContext,
		workers: &[Address],
	) -> Result<()> {
		let manager = ctx.caller;
		let state = tx.world_mut().hub_mut(&self.address())?;
		let count = state.worker_counts.get(&manager).copied().unwrap_or_default();
		if workers.len() as u64 > count {
			return Err(RelayError::Unauthorized("invalid quantity".into()));
		}

		for worker in workers {
			match state.workers.get_mut(worker) {
				Some(entry) if entry.manager == manager && entry.enabled => entry.enabled = false,
				_ => return Err(RelayError::Unauthorized("Incorrect Manager".into())),
			}
		}
		let workers_count = count - workers.len() as u64;
		state.worker_counts.insert(manager, workers_count);

		tx.emit(
			self.address(),
			RelayEvent::RelayWorkersDisabled {
				relay_manager: manager,
				relay_workers: workers.to_vec(),
				workers_count,
			},
		);
		info!(manager = %manager, disabled = workers.len(), workers_count, "Relay workers disabled");
		Ok(())
	}

	/// Publishes the calling manager's relay endpoint.
	pub fn register_relay_server(&self, tx: &mut Tx<'_>, ctx: &CallContext, url: &str) -> Result<()> {
		let manager = ctx.caller;
		let state = tx.world_mut().hub_mut(&self.address())?;
		if !is_staked(state, &manager) {
			return Err(RelayError::NotStaked);
		}
		if state.worker_counts.get(&manager).copied().unwrap_or_default() == 0 {
			return Err(RelayError::Unauthorized("no relay workers".into()));
		}
		state.relay_urls.insert(manager, url.to_string());

		tx.emit(
			self.address(),
			RelayEvent::RelayServerRegistered {
				relay_manager: manager,
				relay_url: url.to_string(),
			},
		);
		info!(manager = %manager, url, "Relay server registered");
		Ok(())
	}
}
