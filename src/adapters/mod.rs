// Adapters layer: concrete page collaborators (http transport, in-memory and terminal surfaces).

pub mod http;
pub mod memory;
pub mod terminal;
