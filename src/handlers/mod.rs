// Handlers grouped by resource. Routing lives in `app`.

pub mod admin;
pub mod auth;
pub mod categorias;
pub mod clientes;
pub mod configuracion;
pub mod pedidos;
pub mod productos;
pub mod public;
pub mod resumen;
