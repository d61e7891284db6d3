//! The two fixed identities that share expenses.

use std::fmt::Display;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::Error;

/// The longest identifier accepted for a partner.
pub const MAX_PARTNER_ID_LENGTH: usize = 32;

/// The value reported by balance summaries when neither partner owes the other.
///
/// It can never be used as a partner identifier.
pub const NO_DEBT: &str = "none";

/// A stable identifier for a partner.
///
/// This is the join key used by expenses and settlements to say who paid whom.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartnerId(String);

impl PartnerId {
    /// Create a partner ID from a raw string.
    ///
    /// Leading and trailing whitespace is ignored.
    ///
    /// # Errors
    /// Returns [Error::InvalidPartnerId] if the ID is empty, longer than
    /// [MAX_PARTNER_ID_LENGTH], contains characters other than ASCII letters,
    /// digits, '-' or '_', or is the reserved word [NO_DEBT].
    pub fn new(raw: &str) -> Result<Self, Error> {
        let id = raw.trim();

        if id.is_empty()
            || id.len() > MAX_PARTNER_ID_LENGTH
            || id.eq_ignore_ascii_case(NO_DEBT)
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::InvalidPartnerId(raw.to_owned()));
        }

        Ok(Self(id.to_owned()))
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PartnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PartnerId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<PartnerId> for String {
    fn from(value: PartnerId) -> Self {
        value.0
    }
}

impl ToSql for PartnerId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for PartnerId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;

        PartnerId::new(raw).map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// One of the two people sharing expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partner {
    /// The stable identifier used on expenses and settlements.
    pub id: PartnerId,
    /// The name to show people.
    pub name: String,
}

impl Partner {
    /// Create a partner, using the ID as the name when `name` is blank.
    pub fn new(id: PartnerId, name: &str) -> Self {
        let name = match name.trim() {
            "" => id.to_string(),
            name => name.to_owned(),
        };

        Self { id, name }
    }
}

/// The fixed pair of partners that every calculation is between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partners {
    first: Partner,
    second: Partner,
}

impl Partners {
    /// Pair up two partners.
    ///
    /// # Errors
    /// Returns [Error::DuplicatePartner] if both partners have the same ID.
    pub fn new(first: Partner, second: Partner) -> Result<Self, Error> {
        if first.id == second.id {
            return Err(Error::DuplicatePartner(first.id));
        }

        Ok(Self { first, second })
    }

    /// The first partner, i.e. partner A.
    pub fn first(&self) -> &Partner {
        &self.first
    }

    /// The second partner, i.e. partner B.
    pub fn second(&self) -> &Partner {
        &self.second
    }

    /// Iterate over both partners, A then B.
    pub fn iter(&self) -> impl Iterator<Item = &Partner> {
        [&self.first, &self.second].into_iter()
    }

    /// Whether `id` belongs to one of the two partners.
    pub fn contains(&self, id: &PartnerId) -> bool {
        self.first.id == *id || self.second.id == *id
    }

    /// Get the partner with the ID `id`.
    pub fn get(&self, id: &PartnerId) -> Option<&Partner> {
        self.iter().find(|partner| partner.id == *id)
    }

    /// Get the partner that is not `id`.
    ///
    /// Returns `None` if `id` is not one of the two partners.
    pub fn other(&self, id: &PartnerId) -> Option<&Partner> {
        if self.first.id == *id {
            Some(&self.second)
        } else if self.second.id == *id {
            Some(&self.first)
        } else {
            None
        }
    }

    /// Check that `id` refers to one of the partners.
    ///
    /// # Errors
    /// Returns [Error::UnknownPartner] if it does not.
    pub fn require(&self, id: &PartnerId) -> Result<&Partner, Error> {
        self.get(id).ok_or_else(|| Error::UnknownPartner(id.clone()))
    }
}



#[cfg(test)]
mod partners_tests {
    use crate::Error;

    use super::{
        Partner, PartnerId, Partners,
        test_partners::{alice, alice_and_bob, bob},
    };

    #[test]
    fn rejects_duplicate_ids() {
        let result = Partners::new(Partner::new(alice(), "Alice"), Partner::new(alice(), "Al"));

        assert_eq!(result, Err(Error::DuplicatePartner(alice())));
    }

    #[test]
    fn blank_name_falls_back_to_id() {
        let partner = Partner::new(bob(), " ");

        assert_eq!(partner.name, "bob");
    }

    #[test]
    fn other_returns_the_opposite_partner() {
        let partners = alice_and_bob();

        assert_eq!(partners.other(&alice()).unwrap().id, bob());
        assert_eq!(partners.other(&bob()).unwrap().id, alice());
    }

    #[test]
    fn other_is_none_for_stranger() {
        let partners = alice_and_bob();
        let carol = PartnerId::new("carol").unwrap();

        assert!(partners.other(&carol).is_none());
        assert!(!partners.contains(&carol));
        assert_eq!(partners.require(&carol), Err(Error::UnknownPartner(carol)));
    }

    #[test]
    fn iterates_in_order() {
        let partners = alice_and_bob();

        let ids: Vec<_> = partners.iter().map(|partner| partner.id.clone()).collect();

        assert_eq!(ids, vec![alice(), bob()]);
    }
}
