mod rpc_block_source;

pub use rpc_block_source::RpcBlockSource;
