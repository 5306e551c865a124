use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcategoria {
    pub nombre: String,
    pub productos: i64,
}

/// A category as derived from the products that name it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Categoria {
    pub nombre: String,
    pub productos: i64,
    pub subcategorias: Vec<Subcategoria>,
}

impl Categoria {
    /// Group `(categoria, subcategoria, count)` rows ordered by categoria.
    /// Products without a subcategoria only count toward the category total.
    pub fn agrupar(rows: Vec<(String, Option<String>, i64)>) -> Vec<Categoria> {
        let mut categorias: Vec<Categoria> = Vec::new();
        for (nombre, subcategoria, productos) in rows {
            if categorias.last().map_or(true, |last| last.nombre != nombre) {
                categorias.push(Categoria {
                    nombre,
                    productos: 0,
                    subcategorias: Vec::new(),
                });
            }
            let Some(categoria) = categorias.last_mut() else {
                continue;
            };
            categoria.productos += productos;
            if let Some(sub) = subcategoria {
                categoria.subcategorias.push(Subcategoria {
                    nombre: sub,
                    productos,
                });
            }
        }
        categorias
    }
}
