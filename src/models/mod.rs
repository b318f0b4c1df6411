pub mod account;

pub use account::{
    Account, AccountSummary, Coordinates, ExternalIdentity, NewAccount, ProfileChanges,
    StoredChallenge,
};
