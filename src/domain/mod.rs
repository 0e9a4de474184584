// Domain layer: content model and the ports to the page (transport, modal, container).

pub mod model;
pub mod ports;
