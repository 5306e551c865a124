pub mod categoria;
pub mod cliente;
pub mod configuracion;
pub mod pedido;
pub mod producto;
pub mod usuario;

use serde::{Deserialize, Serialize};

pub use categoria::{Categoria, Subcategoria};
pub use cliente::{ActualizarCliente, Cliente, ClienteDetalle, ClientesQuery, NuevoCliente};
pub use configuracion::{ActualizarConfiguracion, EntradaConfiguracion, EstadoBot};
pub use pedido::{CambioEstado, EstadoPedido, ItemPedido, NuevoItem, NuevoPedido, Pedido, PedidosQuery};
pub use producto::{
    ActualizarProducto, ClaveProducto, LoteProductos, NuevoProducto, Precio, Producto, ProductosQuery,
};
pub use usuario::{Credenciales, NuevoAdmin, Rol, Sesion, Usuario};

/// One page of a listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagina<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}

/// Resolved `page`/`limit` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginacion {
    pub page: u32,
    pub limit: u32,
}

impl Paginacion {
    pub fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, 100),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    pub fn pagina<T>(&self, items: Vec<T>, total: i64) -> Pagina<T> {
        Pagina {
            items,
            page: self.page,
            limit: self.limit,
            total,
        }
    }
}

/// `ASC`/`DESC` from an already-validated `order` parameter
pub fn sort_direction(order: Option<&str>) -> &'static str {
    match order {
        Some("desc") => "DESC",
        _ => "ASC",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_offset() {
        let p = Paginacion::new(None, None, 20);
        assert_eq!(p, Paginacion { page: 1, limit: 20 });
        assert_eq!(p.offset(), 0);

        let p = Paginacion::new(Some(3), Some(100), 20);
        assert_eq!(p.offset(), 200);
    }

    #[test]
    fn direction_defaults_to_ascending() {
        assert_eq!(sort_direction(None), "ASC");
        assert_eq!(sort_direction(Some("desc")), "DESC");
    }
}
