// Library surface for rembg-server.
// Exposed so integration tests can drive the router in-process with a stub
// model session instead of a real ONNX runtime.

pub mod remover;
pub mod shutdown_signal;
pub mod web;
