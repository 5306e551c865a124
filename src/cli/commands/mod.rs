pub mod admin;
pub mod bot;
pub mod clientes;
pub mod health;
pub mod pedidos;
pub mod productos;
