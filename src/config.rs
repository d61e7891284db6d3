//! Command line options shared by the binaries.

use clap::Args;

use crate::{
    Error,
    partner::{Partner, PartnerId, Partners},
};

/// The two partners sharing expenses.
#[derive(Args, Debug, Clone)]
pub struct PartnerArgs {
    /// The ID of the first partner (partner A), e.g. "alice".
    #[arg(long)]
    pub partner_a: String,

    /// The display name of the first partner. Defaults to their ID.
    #[arg(long, default_value = "")]
    pub partner_a_name: String,

    /// The ID of the second partner (partner B), e.g. "bob".
    #[arg(long)]
    pub partner_b: String,

    /// The display name of the second partner. Defaults to their ID.
    #[arg(long, default_value = "")]
    pub partner_b_name: String,
}

impl PartnerArgs {
    /// Validate the IDs and pair up the partners.
    ///
    /// # Errors
    /// Returns [Error::InvalidPartnerId] if either ID is invalid or
    /// [Error::DuplicatePartner] if both IDs are the same.
    pub fn into_partners(self) -> Result<Partners, Error> {
        let first = Partner::new(PartnerId::new(&self.partner_a)?, &self.partner_a_name);
        let second = Partner::new(PartnerId::new(&self.partner_b)?, &self.partner_b_name);

        Partners::new(first, second)
    }
}
