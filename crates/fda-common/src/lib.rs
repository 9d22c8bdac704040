pub mod clinicaltrials;
pub mod error;
pub mod http;
pub mod openfda;
