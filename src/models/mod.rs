pub mod visit;

pub use visit::{Visit, STATUS_ENDPOINT};
