pub mod banking;
pub mod generic_dcf;
pub mod pharma;
pub mod real_estate;

pub use banking::*;
pub use generic_dcf::*;
pub use pharma::*;
pub use real_estate::*;
