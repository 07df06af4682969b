pub mod publish;
pub mod reconcile;
