mod firm;
mod labour;

pub use firm::{Firm, Ownership};
pub use labour::LabourMarket;
