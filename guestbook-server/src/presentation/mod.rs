pub mod dto;
pub mod grpc_service;
pub mod handlers;
pub mod middleware;
pub mod utils;
