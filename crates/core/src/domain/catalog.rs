use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub i64);

/// A purchasable item as listed in the catalog. Prices here are live; line
/// items keep their own copy taken at selection time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub label: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostCenter {
    pub id: i64,
    pub value: String,
    pub label: String,
}

/// Reference data loaded once per wizard session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    products: Vec<CatalogProduct>,
}

impl Catalog {
    pub fn new(products: Vec<CatalogProduct>) -> Self {
        Self { products }
    }

    pub fn products(&self) -> &[CatalogProduct] {
        &self.products
    }

    pub fn find(&self, label: &str) -> Option<&CatalogProduct> {
        self.products.iter().find(|product| product.label == label)
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl From<Vec<CatalogProduct>> for Catalog {
    fn from(products: Vec<CatalogProduct>) -> Self {
        Self::new(products)
    }
}
