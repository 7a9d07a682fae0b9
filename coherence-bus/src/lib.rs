mod bus;

pub use bus::Bus;
