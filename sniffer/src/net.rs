pub mod interface;
pub mod radio;
