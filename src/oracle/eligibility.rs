//! Collection eligibility checks.
//!
//! A collection that fails any check is priced at zero. Missing required
//! fields reject the collection instead of raising an error.

use crate::oracle::types::{CollectionSnapshot, Eligibility, EligibilityRules, RejectReason};
use tracing::{debug, instrument};

/// Filter deciding whether a collection can be priced at all.
pub struct EligibilityFilter {
    rules: EligibilityRules,
}

impl EligibilityFilter {
    pub fn new(rules: EligibilityRules) -> Self {
        Self { rules }
    }

    /// Run every check in order and return the first rejection.
    #[instrument(skip_all)]
    pub fn check(&self, snapshot: &CollectionSnapshot) -> Eligibility {
        let decision = match self.first_rejection(snapshot) {
            Some(reason) => Eligibility::Rejected(reason),
            None => Eligibility::Eligible,
        };
        debug!("Eligibility decision: {:?}", decision);
        decision
    }

    fn first_rejection(&self, snapshot: &CollectionSnapshot) -> Option<RejectReason> {
        let rules = &self.rules;

        let chain = match snapshot.chain.as_deref() {
            Some(chain) => chain,
            None => return Some(RejectReason::MissingField("chain")),
        };
        if chain != rules.required_chain {
            return Some(RejectReason::WrongChain(chain.to_string()));
        }

        let contract_type = match snapshot.contract.as_ref().and_then(|c| c.contract_type.as_deref()) {
            Some(kind) => kind,
            None => return Some(RejectReason::MissingField("contract.type")),
        };
        if contract_type != rules.required_contract_type {
            return Some(RejectReason::WrongContractType(contract_type.to_string()));
        }

        let collection = snapshot.collection.as_ref();

        match collection.and_then(|c| c.is_nsfw) {
            Some(true) => return Some(RejectReason::Nsfw),
            None if rules.require_nsfw_flag => {
                return Some(RejectReason::MissingField("collection.is_nsfw"))
            }
            _ => {}
        }

        if !rules.trusted_marketplaces.is_empty() {
            let verified = collection
                .map(|c| {
                    c.marketplace_pages.iter().any(|page| {
                        let trusted = page
                            .marketplace_name
                            .as_ref()
                            .is_some_and(|name| rules.trusted_marketplaces.contains(name));
                        trusted && page.verified.unwrap_or(true)
                    })
                })
                .unwrap_or(false);
            if !verified {
                return Some(RejectReason::NoVerifiedMarketplace);
            }
        }

        let owners = collection.and_then(|c| c.distinct_owner_count).unwrap_or(0);
        if owners < rules.min_distinct_owners {
            return Some(RejectReason::TooFewOwners {
                found: owners,
                required: rules.min_distinct_owners,
            });
        }

        None
    }
}
