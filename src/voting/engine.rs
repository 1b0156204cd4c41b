//! # Voting Engine
//!
//! The only code path that writes vote tallies.
//!
//! Each cast is one optimistic transaction that reads the entity and the
//! voter's slip, applies the toggle/swap rules to the tally and writes both
//! back. A concurrent commit to either document makes the commit fail and
//! the whole unit re-runs on fresh reads.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::receipt::{VoteAction, VoteReceipt, VoteTarget};
use crate::auth::{ActorContext, Role};
use crate::config::GovernanceConfig;
use crate::errors::{CoreError, CoreResult};
use crate::governance::derive_status_with;
use crate::model::{Status, VoteChoice, VoteSlip, VoteTally};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::store::{run_transaction, DocKey, EntityStore, StoreError};

struct Applied {
    action: VoteAction,
    previous: Option<VoteChoice>,
    slip: Option<VoteSlip>,
    tally: VoteTally,
    declared: Status,
}

/// Transactional vote processor
pub struct VotingEngine<S: EntityStore> {
    store: Arc<S>,
    config: GovernanceConfig,
    metrics: Arc<MetricsRegistry>,
}

impl<S: EntityStore> VotingEngine<S> {
    pub fn new(store: Arc<S>, config: GovernanceConfig) -> Self {
        Self::with_metrics(store, config, Arc::new(MetricsRegistry::new()))
    }

    pub fn with_metrics(store: Arc<S>, config: GovernanceConfig, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            store,
            config,
            metrics,
        }
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Cast, swap or retract `voter_id`'s vote on an entity.
    ///
    /// Voting the same choice twice withdraws the vote. Voting the other
    /// choice moves the vote. The actor must be at least a citizen and may
    /// only vote as themselves.
    pub fn cast_vote(
        &self,
        actor: &ActorContext,
        target: VoteTarget,
        entity_id: &str,
        voter_id: &str,
        choice: VoteChoice,
    ) -> CoreResult<VoteReceipt> {
        let entity_key = DocKey::entity(target.collection(), entity_id);

        let authorized = actor
            .require_role(Role::Citizen)
            .and_then(|_| actor.require_self(voter_id));
        if let Err(e) = authorized {
            self.reject(&entity_key, voter_id, "AXT_UNAUTHORIZED");
            return Err(e.into());
        }

        let slip_key = DocKey::vote(target.collection(), entity_id, voter_id);

        let attempts = self.config.max_transaction_attempts;
        let result = run_transaction::<_, _, CoreError, _>(self.store.as_ref(), attempts, |txn| {
            let Some(mut entity) = txn.get(&entity_key)? else {
                return Err(CoreError::not_found(&entity_key));
            };
            let existing = txn.get_as::<VoteSlip>(&slip_key)?;

            let declared: Status = read_field(&entity, &entity_key, "status")?;
            let mut tally: VoteTally = match entity.get("stats") {
                Some(stats) if !stats.is_null() => read_field(&entity, &entity_key, "stats")?,
                _ => VoteTally::default(),
            };

            let previous = existing.map(|slip| slip.choice);
            let (action, slip) = match previous {
                Some(prior) if prior == choice => {
                    tally.adjust(choice, -1);
                    txn.delete(slip_key.clone());
                    (VoteAction::Retracted, None)
                }
                prior => {
                    if prior.is_some() {
                        tally.adjust(choice.opposite(), -1);
                    }
                    tally.adjust(choice, 1);
                    let slip = VoteSlip {
                        choice,
                        timestamp: Utc::now(),
                    };
                    txn.set(slip_key.clone(), &slip)?;
                    let action = if prior.is_some() {
                        VoteAction::Swapped
                    } else {
                        VoteAction::Cast
                    };
                    (action, Some(slip))
                }
            };

            let tally = tally.clamped();
            let fields = entity.as_object_mut().ok_or_else(|| StoreError::Malformed {
                key: entity_key.to_string(),
                reason: "expected an object".to_string(),
            })?;
            fields.insert("stats".to_string(), serde_json::to_value(tally)?);
            txn.set_value(entity_key.clone(), entity);

            Ok(Applied {
                action,
                previous,
                slip,
                tally,
                declared,
            })
        });

        let committed = match result {
            Ok(committed) => committed,
            Err(e) => {
                self.reject(&entity_key, voter_id, e.code());
                return Err(e);
            }
        };

        let applied = committed.value;
        self.metrics
            .add_transaction_conflicts(u64::from(committed.attempts.saturating_sub(1)));
        let event = match applied.action {
            VoteAction::Cast => {
                self.metrics.increment_votes_cast();
                Event::VoteCast
            }
            VoteAction::Swapped => {
                self.metrics.increment_votes_swapped();
                Event::VoteSwapped
            }
            VoteAction::Retracted => {
                self.metrics.increment_votes_retracted();
                Event::VoteRetracted
            }
        };

        let status = derive_status_with(&self.config, applied.declared, applied.tally);
        log_event_with_fields(
            event,
            &[
                ("entity", &entity_key.to_string()),
                ("voter", voter_id),
                ("choice", choice.as_str()),
                ("status", status.as_str()),
                ("attempts", &committed.attempts.to_string()),
            ],
        );

        Ok(VoteReceipt {
            target,
            entity_id: entity_id.to_string(),
            voter_id: voter_id.to_string(),
            action: applied.action,
            previous: applied.previous,
            slip: applied.slip,
            tally: applied.tally,
            status,
            revision: committed.revision,
            attempts: committed.attempts,
        })
    }

    /// The slip `voter_id` currently holds on an entity
    pub fn current_vote(
        &self,
        target: VoteTarget,
        entity_id: &str,
        voter_id: &str,
    ) -> CoreResult<Option<VoteSlip>> {
        let key = DocKey::vote(target.collection(), entity_id, voter_id);
        match self.store.get(&key)? {
            Some(doc) => Ok(Some(read_document(doc.data, &key)?)),
            None => Ok(None),
        }
    }

    fn reject(&self, entity_key: &DocKey, voter_id: &str, reason: &str) {
        self.metrics.increment_votes_rejected();
        log_event_with_fields(
            Event::VoteRejected,
            &[
                ("entity", &entity_key.to_string()),
                ("voter", voter_id),
                ("reason", reason),
            ],
        );
    }
}

fn read_field<T: DeserializeOwned>(document: &Value, key: &DocKey, field: &str) -> CoreResult<T> {
    let value = document.get(field).cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|e| {
        CoreError::Store(StoreError::Malformed {
            key: key.to_string(),
            reason: format!("{}: {}", field, e),
        })
    })
}

fn read_document<T: DeserializeOwned>(document: Value, key: &DocKey) -> CoreResult<T> {
    serde_json::from_value(document).map_err(|e| {
        CoreError::Store(StoreError::Malformed {
            key: key.to_string(),
            reason: e.to_string(),
        })
    })
}
