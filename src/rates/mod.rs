pub mod charge_transfer;
pub mod recombination;

pub use charge_transfer::ChargeTransferRates;
pub use recombination::RecombinationRates;
