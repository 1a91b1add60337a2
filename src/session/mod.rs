pub mod result;
pub mod typing;
pub mod virtual_keys;
