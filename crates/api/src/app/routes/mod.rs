pub mod items;
pub mod parts;
pub mod repairs;
