pub mod default;
pub mod rpc;
