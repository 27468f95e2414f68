//! Read consistency overlays and write preconditions.

use chrono::{DateTime, Utc};

use crate::proto::{ConsistencySelector, DocumentPrecondition};

/// Consistency view used for reads made through a reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum ReadSettings {
    /// The latest consistent state.
    #[default]
    Latest,
    /// The state as of a fixed timestamp.
    ReadTime(DateTime<Utc>),
    /// The state seen by an active transaction.
    Transaction(Vec<u8>),
}

impl ReadSettings {
    /// Reads at a fixed timestamp.
    pub fn read_time(time: DateTime<Utc>) -> Self {
        ReadSettings::ReadTime(time)
    }

    /// Reads inside the transaction identified by `token`.
    pub fn transaction(token: impl Into<Vec<u8>>) -> Self {
        ReadSettings::Transaction(token.into())
    }

    /// The selector to send on read requests, `None` for latest reads.
    pub fn consistency_selector(&self) -> Option<ConsistencySelector> {
        match self {
            ReadSettings::Latest => None,
            ReadSettings::ReadTime(t) => Some(ConsistencySelector::ReadTime(*t)),
            ReadSettings::Transaction(token) => {
                Some(ConsistencySelector::Transaction(token.clone()))
            }
        }
    }
}

/// Existence guard on a write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Precondition {
    /// No constraint.
    #[default]
    None,
    /// The document must currently exist.
    MustExist,
    /// The document must not currently exist.
    MustNotExist,
}

impl Precondition {
    /// The wire form, `None` when unconstrained.
    pub fn to_wire(self) -> Option<DocumentPrecondition> {
        match self {
            Precondition::None => None,
            Precondition::MustExist => Some(DocumentPrecondition { exists: Some(true) }),
            Precondition::MustNotExist => Some(DocumentPrecondition {
                exists: Some(false),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_latest_sends_no_selector() {
        assert_eq!(ReadSettings::default().consistency_selector(), None);
    }

    #[test]
    fn test_read_time_selector() {
        let tm = Utc.timestamp_opt(1_613_779_200, 0).unwrap();
        assert_eq!(
            ReadSettings::read_time(tm).consistency_selector(),
            Some(ConsistencySelector::ReadTime(tm))
        );
    }

    #[test]
    fn test_transaction_selector() {
        assert_eq!(
            ReadSettings::transaction(b"tx".to_vec()).consistency_selector(),
            Some(ConsistencySelector::Transaction(b"tx".to_vec()))
        );
    }

    #[test]
    fn test_precondition_wire() {
        assert_eq!(Precondition::None.to_wire(), None);
        assert_eq!(
            Precondition::MustExist.to_wire(),
            Some(DocumentPrecondition { exists: Some(true) })
        );
        assert_eq!(
            Precondition::MustNotExist.to_wire(),
            Some(DocumentPrecondition {
                exists: Some(false)
            })
        );
    }
}
