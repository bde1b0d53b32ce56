use std::collections::BTreeSet;

use crate::identity::IdentityToken;

/// Which way a like request moves a comment's ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTransition {
    Like,
    Unlike,
}

/// Result of applying a transition to a stored comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    Applied { likes_count: u64 },
    AlreadyLiked { likes_count: u64 },
    NotLiked { likes_count: u64 },
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerRejection {
    AlreadyLiked,
    NotLiked,
}

/// Identities currently crediting a like to one comment.
///
/// The count is the set's cardinality, there is no second field to drift.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LikeLedger {
    identities: BTreeSet<IdentityToken>,
}

impl LikeLedger {
    pub fn from_identities(identities: impl IntoIterator<Item = IdentityToken>) -> Self {
        Self {
            identities: identities.into_iter().collect(),
        }
    }

    pub fn count(&self) -> u64 {
        self.identities.len() as u64
    }

    pub fn contains(&self, identity: &IdentityToken) -> bool {
        self.identities.contains(identity)
    }

    pub fn like(&mut self, identity: &IdentityToken) -> Result<u64, LedgerRejection> {
        if !self.identities.insert(identity.clone()) {
            return Err(LedgerRejection::AlreadyLiked);
        }
        Ok(self.count())
    }

    pub fn unlike(&mut self, identity: &IdentityToken) -> Result<u64, LedgerRejection> {
        if !self.identities.remove(identity) {
            return Err(LedgerRejection::NotLiked);
        }
        Ok(self.count())
    }

    pub fn apply(
        &mut self,
        identity: &IdentityToken,
        transition: LikeTransition,
    ) -> Result<u64, LedgerRejection> {
        match transition {
            LikeTransition::Like => self.like(identity),
            LikeTransition::Unlike => self.unlike(identity),
        }
    }

    /// Applies `transition` and folds the result into a store outcome.
    pub fn outcome(&mut self, identity: &IdentityToken, transition: LikeTransition) -> LikeOutcome {
        match self.apply(identity, transition) {
            Ok(likes_count) => LikeOutcome::Applied { likes_count },
            Err(LedgerRejection::AlreadyLiked) => LikeOutcome::AlreadyLiked {
                likes_count: self.count(),
            },
            Err(LedgerRejection::NotLiked) => LikeOutcome::NotLiked {
                likes_count: self.count(),
            },
        }
    }
}
