//
// Dataflow analysis framework
//
pub mod domain;
pub mod generic;
pub mod index;

//
// Clients
//
pub mod pointsto;
